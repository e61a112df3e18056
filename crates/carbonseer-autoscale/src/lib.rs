//! carbonseer-autoscale — carbon-aware replica control.
//!
//! Each cycle measures p95 latency, resolves carbon intensity, scores
//! the combination, reads the workload's replica count and steps it by
//! at most one.
//!
//! # Cycle
//!
//! ```text
//! p95      = latency source (absent on failure)
//! carbon   = resolver.resolve(region)
//! score    = w_slo·slo(p95) + w_carbon·carbon_score + w_cost·cost_score
//! cur      = target.current_replicas()        // failure aborts the cycle
//!
//! if p95 > slo and cur < max:          new = cur + 1
//! elif p95 < slo * 0.6 and cur > min:  new = cur - 1
//! else:                                new = cur
//!
//! patch only when new != cur
//! ```
//!
//! Every cycle re-reads the orchestrator's state rather than trusting its
//! own last decision, so manual scaling and failed patches self-correct.

pub mod controller;
pub mod error;
pub mod latency;
pub mod policy;
pub mod scorer;
pub mod target;

pub use controller::{Controller, CycleReport};
pub use error::{LatencyError, TargetError};
pub use latency::{LatencySource, PrometheusLatency};
pub use policy::{ScaleDecision, ScalePolicy};
pub use scorer::Scorer;
pub use target::{KubeDeployment, ReplicaTarget};
