//! Route handlers, one module per resource.

pub mod catalog;
pub mod platform;
pub mod queue;
pub mod schedule;
pub mod uploads;

use std::collections::HashMap;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::warn;

use super::models::HealthResponse;
use super::state::AppState;

/// Health check endpoint (GET /health)
///
/// Probes both fjall keyspaces and reports the metric counters. Returns 503
/// when any component is unhealthy.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());

    let catalog = match state.catalog.health_check() {
        Ok(()) => "healthy".to_string(),
        Err(e) => {
            warn!(error = %e, "Catalog health check failed");
            format!("unhealthy: {e}")
        }
    };
    components.insert("catalog".to_string(), catalog);

    let queue = match state.queue.health_check() {
        Ok(()) => "healthy".to_string(),
        Err(e) => {
            warn!(error = %e, "Queue health check failed");
            format!("unhealthy: {e}")
        }
    };
    components.insert("queue".to_string(), queue);

    let all_healthy = components.values().all(|status| status == "healthy");
    let (status_code, overall_status) = if all_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
        metrics: state.metrics.snapshot(),
    };

    (status_code, Json(response))
}
