//! Replica target — the orchestration API surface the controller needs.
//!
//! Only `spec.replicas` of one named Deployment is read or written.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use carbonseer_core::DeploymentRef;
use carbonseer_core::config::KubernetesConfig;

use crate::error::TargetError;

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";
const KUBECTL_PROXY_URL: &str = "http://127.0.0.1:8001";
const MERGE_PATCH: &str = "application/merge-patch+json";

/// Read and patch the desired replica count of a workload.
#[async_trait]
pub trait ReplicaTarget: Send + Sync {
    async fn current_replicas(&self) -> Result<u32, TargetError>;

    async fn set_replicas(&self, replicas: u32) -> Result<(), TargetError>;
}

/// Connection settings after defaults have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAccess {
    pub api_url: String,
    pub token_file: Option<PathBuf>,
    pub ca_file: Option<PathBuf>,
}

/// Apply defaults: explicit `api_url`, else the in-cluster service, else
/// a local `kubectl proxy`.
pub fn resolve_access<F>(config: &KubernetesConfig, env: F) -> ResolvedAccess
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(api_url) = &config.api_url {
        return ResolvedAccess {
            api_url: api_url.clone(),
            token_file: config.token_file.clone(),
            ca_file: config.ca_file.clone(),
        };
    }

    if let (Some(host), Some(port)) = (
        env("KUBERNETES_SERVICE_HOST"),
        env("KUBERNETES_SERVICE_PORT"),
    ) {
        let host = if host.contains(':') {
            format!("[{host}]")
        } else {
            host
        };
        let sa = Path::new(SERVICE_ACCOUNT_DIR);
        return ResolvedAccess {
            api_url: format!("https://{host}:{port}"),
            token_file: config
                .token_file
                .clone()
                .or_else(|| Some(sa.join("token"))),
            ca_file: config.ca_file.clone().or_else(|| Some(sa.join("ca.crt"))),
        };
    }

    ResolvedAccess {
        api_url: KUBECTL_PROXY_URL.to_string(),
        token_file: config.token_file.clone(),
        ca_file: config.ca_file.clone(),
    }
}

/// A Kubernetes `apps/v1` Deployment addressed over the REST API.
pub struct KubeDeployment {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    deployment: DeploymentRef,
}

impl KubeDeployment {
    pub fn new(
        api_url: &str,
        token: Option<String>,
        client: reqwest::Client,
        deployment: DeploymentRef,
    ) -> Self {
        let url = format!(
            "{}/apis/apps/v1/namespaces/{}/deployments/{}",
            api_url.trim_end_matches('/'),
            deployment.namespace,
            deployment.name
        );
        Self {
            client,
            url,
            token,
            deployment,
        }
    }

    /// Build a client from config, reading the bearer token and CA bundle.
    pub fn from_config(
        config: &KubernetesConfig,
        deployment: DeploymentRef,
    ) -> Result<Self, TargetError> {
        let access = resolve_access(config, |key| std::env::var(key).ok());

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(config.insecure_skip_tls_verify);
        if let Some(ca_file) = &access.ca_file {
            let pem = std::fs::read(ca_file).map_err(|e| {
                TargetError::Config(format!("read CA bundle {}: {e}", ca_file.display()))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                TargetError::Config(format!("parse CA bundle {}: {e}", ca_file.display()))
            })?;
            builder = builder.add_root_certificate(cert);
        }
        let client = builder.build().map_err(TargetError::Client)?;

        let token = match &access.token_file {
            Some(path) => Some(read_token(path)?),
            None => None,
        };

        info!(
            api_url = %access.api_url,
            deployment = %deployment,
            authenticated = token.is_some(),
            "orchestrator client initialized"
        );
        Ok(Self::new(&access.api_url, token, client, deployment))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TargetError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TargetError::Status { status, body })
    }
}

fn read_token(path: &Path) -> Result<String, TargetError> {
    let token = std::fs::read_to_string(path)
        .map_err(|e| TargetError::Config(format!("read token {}: {e}", path.display())))?;
    Ok(token.trim().to_string())
}

#[async_trait]
impl ReplicaTarget for KubeDeployment {
    async fn current_replicas(&self) -> Result<u32, TargetError> {
        let response = self.authorize(self.client.get(&self.url)).send().await?;
        let body: Value = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| TargetError::Malformed(e.to_string()))?;

        let replicas = body
            .pointer("/spec/replicas")
            .and_then(Value::as_u64)
            .ok_or_else(|| TargetError::Malformed("spec.replicas missing".into()))?;
        let replicas = u32::try_from(replicas)
            .map_err(|_| TargetError::Malformed(format!("spec.replicas out of range: {replicas}")))?;

        debug!(deployment = %self.deployment, replicas, "read replica count");
        Ok(replicas)
    }

    async fn set_replicas(&self, replicas: u32) -> Result<(), TargetError> {
        let body = json!({ "spec": { "replicas": replicas } });
        let request = self
            .client
            .patch(&self.url)
            .header(reqwest::header::CONTENT_TYPE, MERGE_PATCH)
            .body(body.to_string());
        let response = self.authorize(request).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
