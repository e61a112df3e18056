//! WattTime provider.
//!
//! Queries the signal index endpoint with `Authorization: Token ...`.
//! The value arrives as `moer`, `index_value` or `value` depending on
//! API generation.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use carbonseer_core::ProviderSpec;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{CarbonProvider, extract_intensity, get_json, http_client};

const CANDIDATES: &[&str] = &["/moer", "/index_value", "/value"];

pub struct WattTime {
    spec: ProviderSpec,
    client: reqwest::Client,
}

impl WattTime {
    pub fn new(spec: ProviderSpec, timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            spec,
            client: http_client(timeout)?,
        })
    }

    async fn try_fetch(&self) -> ProviderResult<f64> {
        let token = self
            .spec
            .credential
            .as_deref()
            .ok_or(ProviderError::NotConfigured("token"))?;
        let endpoint = self
            .spec
            .endpoint
            .as_deref()
            .ok_or(ProviderError::NotConfigured("endpoint"))?;

        // WattTime regions are balancing authorities, not our region
        // names, so only an explicitly configured zone is sent.
        let mut request = self
            .client
            .get(endpoint)
            .header("Authorization", format!("Token {token}"));
        if let Some(zone) = self.spec.zone.as_deref() {
            request = request.query(&[("region", zone)]);
        }

        let payload = get_json(request).await?;
        extract_intensity(&payload, CANDIDATES)
    }
}

#[async_trait]
impl CarbonProvider for WattTime {
    fn name(&self) -> &str {
        "watttime"
    }

    async fn fetch(&self, region: &str) -> Option<f64> {
        match self.try_fetch().await {
            Ok(value) => {
                debug!(provider = self.name(), %region, value, "carbon intensity fetched");
                Some(value)
            }
            Err(e) => {
                warn!(provider = self.name(), %region, error = %e, "carbon provider fetch failed");
                None
            }
        }
    }
}
