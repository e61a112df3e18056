//! HTTP handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

use carbonseer_metrics::{CONTENT_TYPE, ControllerMetrics, render_prometheus};
use tracing::{info, warn};

use crate::IngestState;
use crate::update::CarbonUpdate;

/// POST /update_carbon
pub async fn update_carbon(State(state): State<IngestState>, body: Bytes) -> impl IntoResponse {
    let update = match CarbonUpdate::parse(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "rejected carbon update");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    state.cache.push(&update.region, update.carbon).await;
    info!(
        region = %update.region,
        carbon = update.carbon,
        timestamp = update.timestamp.as_deref().unwrap_or(""),
        "carbon update ingested"
    );
    (StatusCode::OK, "ok").into_response()
}

/// GET /metrics
pub async fn prometheus_metrics(State(metrics): State<ControllerMetrics>) -> impl IntoResponse {
    let body = render_prometheus(&metrics.snapshot());
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}
