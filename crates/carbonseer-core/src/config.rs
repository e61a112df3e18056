//! carbonseer.toml configuration parser.
//!
//! The config is loaded once at startup and never reloaded. Every field
//! except the Prometheus URL and the deployment identity has a default.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{DEFAULT_REGION, DeploymentRef, ProviderKind, ProviderSpec};

const DEFAULT_LATENCY_QUERY: &str =
    "histogram_quantile(0.95, sum(rate(demo_request_latency_seconds_bucket[1m])) by (le))";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Region whose carbon intensity feeds the score.
    #[serde(default = "default_region")]
    pub region: String,
    pub prometheus: PrometheusConfig,
    pub deployment: DeploymentRef,
    #[serde(default = "default_min_replicas")]
    pub min_replicas: u32,
    #[serde(default = "default_max_replicas")]
    pub max_replicas: u32,
    #[serde(default = "default_slo_p95_ms")]
    pub slo_p95_ms: f64,
    #[serde(default)]
    pub weights: Weights,
    #[serde(default = "default_cost_per_replica")]
    pub cost_per_replica: f64,
    #[serde(default = "default_cost_norm_max")]
    pub cost_norm_max: f64,
    #[serde(default = "default_carbon")]
    pub default_carbon: f64,
    /// Static region → gCO2eq/kWh fallback table.
    #[serde(default)]
    pub carbon_map: HashMap<String, f64>,
    #[serde(default)]
    pub carbon_providers: ProvidersConfig,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "default_interval_s")]
    pub interval_s: u64,
    #[serde(default)]
    pub http_api: HttpApiConfig,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    pub url: String,
    /// PromQL expression yielding p95 latency in seconds.
    #[serde(default = "default_latency_query")]
    pub query: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Objective weights. Read verbatim, never renormalized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Weights {
    pub slo: f64,
    pub carbon: f64,
    pub cost: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            slo: 0.6,
            carbon: 0.3,
            cost: 0.1,
        }
    }
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.slo + self.carbon + self.cost
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub electricitymap: Option<ElectricityMapConfig>,
    #[serde(default)]
    pub watttime: Option<WattTimeConfig>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            electricitymap: None,
            watttime: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElectricityMapConfig {
    #[serde(default)]
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WattTimeConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(alias = "endpoint_index")]
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

/// Access to the orchestration API. Unset fields fall back to the
/// in-cluster service account, then to a local `kubectl proxy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubernetesConfig {
    pub api_url: Option<String>,
    pub token_file: Option<PathBuf>,
    pub ca_file: Option<PathBuf>,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            token_file: None,
            ca_file: None,
            insecure_skip_tls_verify: false,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}
fn default_latency_query() -> String {
    DEFAULT_LATENCY_QUERY.to_string()
}
fn default_timeout_seconds() -> u64 {
    8
}
fn default_min_replicas() -> u32 {
    1
}
fn default_max_replicas() -> u32 {
    10
}
fn default_slo_p95_ms() -> f64 {
    200.0
}
fn default_cost_per_replica() -> f64 {
    0.02
}
fn default_cost_norm_max() -> f64 {
    1.0
}
fn default_carbon() -> f64 {
    300.0
}
fn default_cache_ttl_seconds() -> u64 {
    300
}
fn default_interval_s() -> u64 {
    15
}
fn default_true() -> bool {
    true
}
fn default_http_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    9200
}
fn default_metrics_port() -> u16 {
    9102
}

impl ControllerConfig {
    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: ControllerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.prometheus.url.trim().is_empty() {
            return Err(ConfigError::Missing("prometheus.url"));
        }
        if self.deployment.namespace.trim().is_empty() {
            return Err(ConfigError::Missing("deployment.namespace"));
        }
        if self.deployment.name.trim().is_empty() {
            return Err(ConfigError::Missing("deployment.name"));
        }
        if self.min_replicas > self.max_replicas {
            return Err(ConfigError::invalid(
                "min_replicas",
                format!(
                    "min_replicas {} exceeds max_replicas {}",
                    self.min_replicas, self.max_replicas
                ),
            ));
        }
        if !(self.slo_p95_ms.is_finite() && self.slo_p95_ms > 0.0) {
            return Err(ConfigError::invalid("slo_p95_ms", "must be positive"));
        }
        if self.interval_s == 0 {
            return Err(ConfigError::invalid("interval_s", "must be positive"));
        }
        if !(self.cost_norm_max.is_finite() && self.cost_norm_max > 0.0) {
            return Err(ConfigError::invalid("cost_norm_max", "must be positive"));
        }
        if !self.cost_per_replica.is_finite() {
            return Err(ConfigError::invalid("cost_per_replica", "must be finite"));
        }
        if !self.default_carbon.is_finite() {
            return Err(ConfigError::invalid("default_carbon", "must be finite"));
        }
        for (name, w) in [
            ("weights.slo", self.weights.slo),
            ("weights.carbon", self.weights.carbon),
            ("weights.cost", self.weights.cost),
        ] {
            if !(w.is_finite() && w >= 0.0) {
                return Err(ConfigError::Invalid {
                    field: name,
                    reason: format!("weight {w} must be finite and non-negative"),
                });
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval_s)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Provider definitions in priority order, with credentials taken from
    /// the process environment when absent from the file.
    pub fn provider_specs(&self) -> Vec<ProviderSpec> {
        self.provider_specs_with_env(|key| std::env::var(key).ok())
    }

    /// Like [`provider_specs`](Self::provider_specs) with an injectable
    /// environment lookup.
    pub fn provider_specs_with_env<F>(&self, env: F) -> Vec<ProviderSpec>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = |kind: ProviderKind, configured: &Option<String>| {
            configured
                .clone()
                .filter(|c| !c.is_empty())
                .or_else(|| env(kind.credential_env()).filter(|c| !c.is_empty()))
        };

        let mut specs = Vec::new();
        if let Some(em) = &self.carbon_providers.electricitymap {
            specs.push(ProviderSpec {
                kind: ProviderKind::ElectricityMap,
                enabled: em.enabled,
                credential: credential(ProviderKind::ElectricityMap, &em.api_key),
                endpoint: em.endpoint.clone(),
                zone: em.zone.clone(),
            });
        }
        if let Some(wt) = &self.carbon_providers.watttime {
            specs.push(ProviderSpec {
                kind: ProviderKind::WattTime,
                enabled: wt.enabled,
                credential: credential(ProviderKind::WattTime, &wt.token),
                endpoint: wt.endpoint.clone(),
                zone: wt.zone.clone(),
            });
        }
        specs
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.carbon_providers.timeout_seconds)
    }
}
