//! p95 latency source.
//!
//! Issues one instant PromQL query per cycle against the Prometheus HTTP
//! API and converts the single sample from seconds to milliseconds.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use carbonseer_core::config::PrometheusConfig;

use crate::error::LatencyError;

/// Something that can report the workload's current p95 latency.
#[async_trait]
pub trait LatencySource: Send + Sync {
    /// Current p95 latency in milliseconds.
    async fn p95_ms(&self) -> Result<f64, LatencyError>;
}

pub struct PrometheusLatency {
    client: reqwest::Client,
    query_url: String,
    query: String,
}

impl PrometheusLatency {
    pub fn new(base_url: &str, query: impl Into<String>, timeout: Duration) -> Result<Self, LatencyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LatencyError::Client)?;
        Ok(Self {
            client,
            query_url: format!("{}/api/v1/query", base_url.trim_end_matches('/')),
            query: query.into(),
        })
    }

    pub fn from_config(config: &PrometheusConfig) -> Result<Self, LatencyError> {
        Self::new(
            &config.url,
            config.query.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }
}

#[async_trait]
impl LatencySource for PrometheusLatency {
    async fn p95_ms(&self) -> Result<f64, LatencyError> {
        let response = self
            .client
            .get(&self.query_url)
            .query(&[("query", self.query.as_str())])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(LatencyError::Malformed(e.to_string())),
            Err(_) => return Err(LatencyError::Status(status)),
        };

        // Prometheus reports query errors with a JSON body and 4xx/5xx.
        if body.get("status").and_then(Value::as_str) == Some("error") {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(LatencyError::Query(message.to_string()));
        }
        if !status.is_success() {
            return Err(LatencyError::Status(status));
        }

        let seconds = parse_instant_sample(&body)?;
        let ms = seconds * 1000.0;
        debug!(p95_ms = ms, "latency sample");
        Ok(ms)
    }
}

/// Extract the first sample of an instant query result, in seconds.
///
/// Handles `vector` and `scalar` result types. `NaN` (a histogram with no
/// traffic) counts as no data.
pub fn parse_instant_sample(body: &Value) -> Result<f64, LatencyError> {
    let data = body
        .get("data")
        .ok_or_else(|| LatencyError::Malformed("missing data".into()))?;
    let result_type = data.get("resultType").and_then(Value::as_str);

    let sample = match result_type {
        Some("vector") => data
            .pointer("/result/0/value/1")
            .ok_or(LatencyError::NoData)?,
        Some("scalar") => data
            .pointer("/result/1")
            .ok_or_else(|| LatencyError::Malformed("scalar without value".into()))?,
        other => {
            return Err(LatencyError::Malformed(format!(
                "unsupported result type {other:?}"
            )));
        }
    };

    let raw = sample
        .as_str()
        .ok_or_else(|| LatencyError::Malformed(format!("sample is not a string: {sample}")))?;
    let seconds: f64 = raw
        .parse()
        .map_err(|_| LatencyError::Malformed(format!("sample is not numeric: {raw}")))?;

    if seconds.is_finite() {
        Ok(seconds)
    } else {
        Err(LatencyError::NoData)
    }
}
