//! carbonseer-metrics — observability for the replica controller.
//!
//! The controller writes gauges and counters each cycle; a scrape reads
//! them back as Prometheus text. Nothing here feeds back into decisions.
//!
//! # Architecture
//!
//! ```text
//! ControllerMetrics
//!   ├── set_p95_latency_ms() / set_score() / set_carbon()  ← each cycle
//!   ├── inc_scale_events()                                 ← each successful patch
//!   └── snapshot() → MetricsSnapshot
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod gauges;
pub mod prometheus;

pub use gauges::{ControllerMetrics, MetricsSnapshot};
pub use prometheus::{CONTENT_TYPE, render_prometheus};
