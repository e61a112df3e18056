//! Shared domain types.

use serde::{Deserialize, Serialize};

/// Region used when neither the config nor an ingestion payload names one.
pub const DEFAULT_REGION: &str = "local";

// ── Deployment ─────────────────────────────────────────────────────

/// Identity of the workload whose replica count is controlled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentRef {
    pub namespace: String,
    pub name: String,
}

impl std::fmt::Display for DeploymentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// ── Carbon providers ───────────────────────────────────────────────

/// Known carbon-intensity data sources, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    ElectricityMap,
    WattTime,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::ElectricityMap => "electricitymap",
            ProviderKind::WattTime => "watttime",
        }
    }

    /// Environment variable consulted when the credential is not in the config file.
    pub fn credential_env(&self) -> &'static str {
        match self {
            ProviderKind::ElectricityMap => "ELECTRICITYMAP_API_KEY",
            ProviderKind::WattTime => "WATTTIME_TOKEN",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved carbon provider definition. Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    pub enabled: bool,
    /// API key or token, from the config file or the provider's env var.
    pub credential: Option<String>,
    pub endpoint: Option<String>,
    /// Provider-side zone/region key. Falls back to the resolved region.
    pub zone: Option<String>,
}

// ── Scoring ────────────────────────────────────────────────────────

/// Output of one scoring pass. Recomputed every cycle, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Latency-SLO compliance in [0, 1].
    pub slo_score: f64,
    /// Grid cleanliness in [0, 1]; 1 means zero intensity.
    pub carbon_score: f64,
    /// Per-replica cost penalty in [0, 1]; 1 means free.
    pub cost_score: f64,
    /// Weighted sum of the three scores.
    pub combined: f64,
    /// Carbon intensity the carbon score was derived from (gCO2eq/kWh).
    pub carbon_value: f64,
}
