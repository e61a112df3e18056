//! Step scaling policy.
//!
//! Moves the replica count by at most one per cycle based on p95 latency
//! alone. The combined score is observational; it does not gate scaling.

use carbonseer_core::ControllerConfig;

/// Scale down once latency is under this fraction of the SLO target.
pub const SCALE_DOWN_RATIO: f64 = 0.6;

/// A scaling decision for the controlled workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Patch the workload to the specified replica count.
    ScaleTo(u32),
    /// No change needed.
    NoChange,
}

/// Replica bounds and the latency target the policy steers towards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalePolicy {
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub slo_target_ms: f64,
}

impl ScalePolicy {
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            min_replicas: config.min_replicas,
            max_replicas: config.max_replicas,
            slo_target_ms: config.slo_p95_ms,
        }
    }

    /// Decide the next replica count given the current one.
    ///
    /// Absent latency never steps the count. The result is always inside
    /// `[min_replicas, max_replicas]`, so a workload found outside the
    /// bounds (e.g. scaled by hand) is pulled back in.
    pub fn decide(&self, p95_ms: Option<f64>, current: u32) -> ScaleDecision {
        let stepped = match p95_ms {
            Some(latency) if latency > self.slo_target_ms && current < self.max_replicas => {
                current + 1
            }
            Some(latency)
                if latency < self.slo_target_ms * SCALE_DOWN_RATIO
                    && current > self.min_replicas =>
            {
                current - 1
            }
            _ => current,
        };

        let desired = stepped.clamp(self.min_replicas, self.max_replicas);
        if desired == current {
            ScaleDecision::NoChange
        } else {
            ScaleDecision::ScaleTo(desired)
        }
    }
}
