//! carbonseer-api — HTTP surfaces of the controller.
//!
//! Two independent routers, served on separate ports:
//!
//! | Method | Path | Router | Description |
//! |---|---|---|---|
//! | POST | `/update_carbon` | ingest | Push a carbon reading for a region |
//! | GET | `/metrics` | metrics | Prometheus exposition |
//!
//! Any other path answers 404.

pub mod handlers;
pub mod update;

use axum::Router;
use axum::routing::{get, post};

use carbonseer_carbon::CarbonCache;
use carbonseer_metrics::ControllerMetrics;

pub use update::{CarbonUpdate, UpdateError};

/// Shared state for the ingestion handler.
#[derive(Clone)]
pub struct IngestState {
    pub cache: CarbonCache,
}

/// Router accepting pushed carbon readings. Writes go straight into the
/// cache the resolver reads from.
pub fn ingest_router(cache: CarbonCache) -> Router {
    Router::new()
        .route("/update_carbon", post(handlers::update_carbon))
        .with_state(IngestState { cache })
}

/// Router exposing controller metrics for scraping.
pub fn metrics_router(metrics: ControllerMetrics) -> Router {
    Router::new()
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(metrics)
}
