//! Carbon provider capability and shared HTTP plumbing.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use carbonseer_core::{ProviderKind, ProviderSpec};

use crate::electricitymap::ElectricityMap;
use crate::error::{ProviderError, ProviderResult};
use crate::watttime::WattTime;

/// A source of spot carbon intensity.
///
/// `fetch` never errors: any failure is logged by the implementation and
/// reported as `None`.
#[async_trait]
pub trait CarbonProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Current intensity for `region` in gCO2eq/kWh, if obtainable.
    async fn fetch(&self, region: &str) -> Option<f64>;
}

/// Instantiate the enabled providers, preserving priority order.
pub fn build_providers(
    specs: &[ProviderSpec],
    timeout: Duration,
) -> ProviderResult<Vec<Box<dyn CarbonProvider>>> {
    let mut providers: Vec<Box<dyn CarbonProvider>> = Vec::new();
    for spec in specs {
        if !spec.enabled {
            debug!(provider = %spec.kind, "provider disabled");
            continue;
        }
        match spec.kind {
            ProviderKind::ElectricityMap => {
                providers.push(Box::new(ElectricityMap::new(spec.clone(), timeout)?));
            }
            ProviderKind::WattTime => {
                providers.push(Box::new(WattTime::new(spec.clone(), timeout)?));
            }
        }
    }
    Ok(providers)
}

pub(crate) fn http_client(timeout: Duration) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent("carbonseer/0.1")
        .build()
        .map_err(ProviderError::Client)
}

/// Send a prepared GET and decode the JSON body.
pub(crate) async fn get_json(request: reqwest::RequestBuilder) -> ProviderResult<Value> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status));
    }
    Ok(response.json::<Value>().await?)
}

/// Pull a single intensity out of a provider payload.
///
/// `candidates` are JSON pointers tried in order; the first one present
/// decides. Numbers and numeric strings are accepted.
pub fn extract_intensity(payload: &Value, candidates: &[&str]) -> ProviderResult<f64> {
    let found = candidates
        .iter()
        .find_map(|pointer| payload.pointer(pointer).filter(|v| !v.is_null()))
        .ok_or(ProviderError::MissingField)?;

    let value = match found {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ProviderError::InvalidValue(found.to_string())),
    }
}
