//! Health and scheduler observability handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use jobhands_engine::{FireEvent, MetricsSnapshot};

use crate::dto::HealthResponse;
use crate::state::ApiState;

/// GET /health
pub async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let engine = state.service.engine();
    Json(HealthResponse {
        status: if engine.is_shutdown() { "stopping" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        scheduler_started: engine.is_started(),
        scheduled_jobs: engine.job_keys().len(),
    })
}

/// GET /scheduler/metrics
pub async fn scheduler_metrics(State(state): State<Arc<ApiState>>) -> Json<MetricsSnapshot> {
    Json(state.service.engine().metrics())
}

/// GET /scheduler/events
pub async fn scheduler_events(State(state): State<Arc<ApiState>>) -> Json<Vec<FireEvent>> {
    Json(state.service.engine().recent_events())
}
