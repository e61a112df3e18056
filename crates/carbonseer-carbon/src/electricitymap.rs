//! ElectricityMap provider.
//!
//! `GET {endpoint}?zone={zone}` with an `auth-token` header. v3 nests the
//! value under `data`; older payloads carry it at the top level.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use carbonseer_core::ProviderSpec;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{CarbonProvider, extract_intensity, get_json, http_client};

const CANDIDATES: &[&str] = &[
    "/data/carbonIntensity",
    "/data/carbon_intensity",
    "/carbonIntensity",
    "/carbon_intensity",
    "/gCO2eq_per_kWh",
];

pub struct ElectricityMap {
    spec: ProviderSpec,
    client: reqwest::Client,
}

impl ElectricityMap {
    pub fn new(spec: ProviderSpec, timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            spec,
            client: http_client(timeout)?,
        })
    }

    async fn try_fetch(&self, region: &str) -> ProviderResult<f64> {
        let api_key = self
            .spec
            .credential
            .as_deref()
            .ok_or(ProviderError::NotConfigured("api_key"))?;
        let endpoint = self
            .spec
            .endpoint
            .as_deref()
            .ok_or(ProviderError::NotConfigured("endpoint"))?;
        let zone = self.spec.zone.as_deref().unwrap_or(region);

        let request = self
            .client
            .get(endpoint)
            .query(&[("zone", zone)])
            .header("auth-token", api_key);
        let payload = get_json(request).await?;
        extract_intensity(&payload, CANDIDATES)
    }
}

#[async_trait]
impl CarbonProvider for ElectricityMap {
    fn name(&self) -> &str {
        "electricitymap"
    }

    async fn fetch(&self, region: &str) -> Option<f64> {
        match self.try_fetch(region).await {
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
