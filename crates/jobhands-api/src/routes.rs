//! Router construction.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};
use tower_http::trace::TraceLayer;

use crate::jobs;
use crate::monitoring;
use crate::state::ApiState;

/// Create the full API router.
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(monitoring::health))
        .nest("/jobs", job_routes())
        .nest("/scheduler", scheduler_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn job_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(jobs::list_jobs).post(jobs::create_job))
        .route("/{id}", get(jobs::get_job).delete(jobs::delete_job))
        .route("/{id}/triggers", get(jobs::list_triggers))
        .route("/{id}/schedule", put(jobs::schedule))
        .route("/{id}/reschedule", put(jobs::reschedule))
        .route("/{id}/unschedule", put(jobs::unschedule))
        .route("/{id}/pause", put(jobs::pause))
        .route("/{id}/resume", put(jobs::resume))
        .route("/{id}/fire", put(jobs::fire))
}

fn scheduler_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/metrics", get(monitoring::scheduler_metrics))
        .route("/events", get(monitoring::scheduler_events))
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
