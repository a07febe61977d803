//! Job HTTP route handlers.
//!
//! - GET    /jobs                  - List jobs with status
//! - POST   /jobs                  - Create job
//! - GET    /jobs/{id}             - Get job
//! - DELETE /jobs/{id}             - Delete job
//! - GET    /jobs/{id}/triggers    - List triggers with status
//! - PUT    /jobs/{id}/schedule    - Schedule (and the other control actions)

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use jobhands_control::JobView;
use jobhands_store::{JobRecord, SearchCriteria};
use tracing::info;

use crate::dto::{CreateJobRequest, JobListResponse, TriggerListResponse};
use crate::error::ApiResult;
use crate::state::ApiState;

/// List jobs.
///
/// GET /jobs?q=&group=&job_class=&offset=&limit=
pub async fn list_jobs(
    State(state): State<Arc<ApiState>>,
    Query(criteria): Query<SearchCriteria>,
) -> ApiResult<Json<JobListResponse>> {
    let jobs = state.service.list_jobs(&criteria).await?;
    Ok(Json(JobListResponse {
        count: jobs.len(),
        jobs,
    }))
}

/// Create a job record and its triggers.
///
/// POST /jobs
pub async fn create_job(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<JobRecord>)> {
    let (record, triggers) = request.into_parts()?;
    let record = state.service.create_job(record, triggers).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Get a job by ID.
///
/// GET /jobs/{id}
pub async fn get_job(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobView>> {
    Ok(Json(state.service.get_job(&id).await?))
}

/// Delete a job.
///
/// DELETE /jobs/{id}
pub async fn delete_job(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    info!(job_id = %id, "Deleting job");
    state.service.delete_job(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a job's triggers.
///
/// GET /jobs/{id}/triggers
pub async fn list_triggers(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<TriggerListResponse>> {
    let triggers = state.service.list_triggers(&id).await?;
    Ok(Json(TriggerListResponse {
        count: triggers.len(),
        triggers,
    }))
}

/// PUT /jobs/{id}/schedule
pub async fn schedule(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> ApiResult<Json<bool>> {
    Ok(Json(state.service.schedule(&id).await?))
}

/// PUT /jobs/{id}/reschedule
pub async fn reschedule(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> ApiResult<Json<bool>> {
    Ok(Json(state.service.reschedule(&id).await?))
}

/// PUT /jobs/{id}/unschedule
pub async fn unschedule(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> ApiResult<Json<bool>> {
    Ok(Json(state.service.unschedule(&id).await?))
}

/// PUT /jobs/{id}/pause
pub async fn pause(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> ApiResult<Json<bool>> {
    Ok(Json(state.service.pause(&id).await?))
}

/// PUT /jobs/{id}/resume
pub async fn resume(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> ApiResult<Json<bool>> {
    Ok(Json(state.service.resume(&id).await?))
}

/// PUT /jobs/{id}/fire
pub async fn fire(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> ApiResult<Json<bool>> {
    Ok(Json(state.service.fire_now(&id).await?))
}
