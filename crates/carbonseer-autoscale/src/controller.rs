//! Replica controller — the periodic measure/score/decide/patch loop.
//!
//! The controller is the only writer of scaling decisions. Collaborator
//! failures are handled here, one call site each:
//!
//! - latency source error → cycle continues with absent latency
//! - replica read error   → cycle stops before deciding
//! - patch error          → logged; the next cycle re-reads and retries

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use carbonseer_core::{ControllerConfig, DeploymentRef, ScoreResult};
use carbonseer_metrics::ControllerMetrics;

use crate::latency::LatencySource;
use crate::policy::{ScaleDecision, ScalePolicy};
use crate::scorer::Scorer;
use crate::target::ReplicaTarget;

/// What one cycle observed and did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub p95_ms: Option<f64>,
    pub scores: ScoreResult,
    /// Replica count read from the orchestrator; `None` if the read failed.
    pub current: Option<u32>,
    pub decision: ScaleDecision,
    /// Whether a patch was issued and accepted.
    pub patched: bool,
}

pub struct Controller {
    deployment: DeploymentRef,
    region: String,
    interval: Duration,
    policy: ScalePolicy,
    scorer: Scorer,
    latency: Arc<dyn LatencySource>,
    target: Arc<dyn ReplicaTarget>,
    metrics: ControllerMetrics,
}

impl Controller {
    pub fn new(
        config: &ControllerConfig,
        scorer: Scorer,
        latency: Arc<dyn LatencySource>,
        target: Arc<dyn ReplicaTarget>,
        metrics: ControllerMetrics,
    ) -> Self {
        Self {
            deployment: config.deployment.clone(),
            region: config.region.clone(),
            interval: config.poll_interval(),
            policy: ScalePolicy::from_config(config),
            scorer,
            latency,
            target,
            metrics,
        }
    }

    /// Run one full cycle. Never fails; degraded paths are logged.
    pub async fn run_cycle(&self) -> CycleReport {
        let p95_ms = match self.latency.p95_ms().await {
            Ok(ms) => {
                self.metrics.set_p95_latency_ms(ms);
                Some(ms)
            }
            Err(e) => {
                warn!(deployment = %self.deployment, error = %e, "latency unavailable, scoring as neutral");
                None
            }
        };

        let scores = self.scorer.score(p95_ms, &self.region).await;
        self.metrics.set_score(scores.combined);
        self.metrics.set_carbon(scores.carbon_value);
        self.metrics.inc_cycles();

        let current = match self.target.current_replicas().await {
            Ok(n) => n,
            Err(e) => {
                error!(deployment = %self.deployment, error = %e, "failed to read replicas, skipping cycle");
                return CycleReport {
                    p95_ms,
                    scores,
                    current: None,
                    decision: ScaleDecision::NoChange,
                    patched: false,
                };
            }
        };

        let decision = self.policy.decide(p95_ms, current);
        let mut patched = false;
        let mut next = current;

        if let ScaleDecision::ScaleTo(replicas) = decision {
            match self.target.set_replicas(replicas).await {
                Ok(()) => {
                    self.metrics.inc_scale_events();
                    patched = true;
                    next = replicas;
                    info!(deployment = %self.deployment, from = current, to = replicas, "patched replicas");
                }
                Err(e) => {
                    warn!(
                        deployment = %self.deployment,
                        from = current,
                        to = replicas,
                        error = %e,
                        "failed to patch replicas"
                    );
                }
            }
        }

        info!(
            deployment = %self.deployment,
            region = %self.region,
            p95_ms = ?p95_ms,
            slo = scores.slo_score,
            carbon = scores.carbon_score,
            cost = scores.cost_score,
            combined = scores.combined,
            carbon_g = scores.carbon_value,
            replicas = current,
            next,
            "control cycle complete"
        );

        CycleReport {
            p95_ms,
            scores,
            current: Some(current),
            decision,
            patched,
        }
    }

    /// Run the control loop until shutdown signal.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        info!(
            deployment = %self.deployment,
            region = %self.region,
            interval_secs = self.interval.as_secs(),
            "controller started"
        );

        loop {
            self.run_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => {
                    info!("controller shutting down");
                    break;
                }
            }
        }
    }
}
