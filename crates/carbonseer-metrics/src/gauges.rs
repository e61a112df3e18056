//! Controller gauges and counters.
//!
//! Gauges hold `f64` bit patterns in atomics so the control loop and the
//! scrape handler never contend on a lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

#[derive(Debug)]
struct Inner {
    deployment: String,
    p95_latency_ms: AtomicU64,
    current_score: AtomicU64,
    carbon_intensity: AtomicU64,
    scale_events: AtomicU64,
    cycles: AtomicU64,
}

/// Point-in-time copy of all controller metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub deployment: String,
    pub p95_latency_ms: f64,
    pub current_score: f64,
    pub carbon_intensity: f64,
    pub scale_events: u64,
    pub cycles: u64,
}

/// Cloneable handle shared by the controller and the metrics endpoint.
#[derive(Debug, Clone)]
pub struct ControllerMetrics {
    inner: Arc<Inner>,
}

impl ControllerMetrics {
    /// Create metrics labelled with the controlled deployment (`ns/name`).
    pub fn new(deployment: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                deployment: deployment.into(),
                p95_latency_ms: AtomicU64::new(0f64.to_bits()),
                current_score: AtomicU64::new(0f64.to_bits()),
                carbon_intensity: AtomicU64::new(0f64.to_bits()),
                scale_events: AtomicU64::new(0),
                cycles: AtomicU64::new(0),
            }),
        }
    }

    pub fn set_p95_latency_ms(&self, value: f64) {
        store_f64(&self.inner.p95_latency_ms, value);
    }

    pub fn set_score(&self, value: f64) {
        store_f64(&self.inner.current_score, value);
    }

    pub fn set_carbon(&self, value: f64) {
        store_f64(&self.inner.carbon_intensity, value);
    }

    pub fn inc_scale_events(&self) {
        let total = self.inner.scale_events.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(total, "scale event recorded");
    }

    pub fn inc_cycles(&self) {
        self.inner.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            deployment: self.inner.deployment.clone(),
            p95_latency_ms: load_f64(&self.inner.p95_latency_ms),
            current_score: load_f64(&self.inner.current_score),
            carbon_intensity: load_f64(&self.inner.carbon_intensity),
            scale_events: self.inner.scale_events.load(Ordering::Relaxed),
            cycles: self.inner.cycles.load(Ordering::Relaxed),
        }
    }
}

fn store_f64(slot: &AtomicU64, value: f64) {
    slot.store(value.to_bits(), Ordering::Relaxed);
}

fn load_f64(slot: &AtomicU64) -> f64 {
    f64::from_bits(slot.load(Ordering::Relaxed))
}
