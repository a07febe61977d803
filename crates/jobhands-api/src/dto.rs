//! Request and response payloads.

use jobhands_control::{JobView, TriggerInfo, TriggerView};
use jobhands_engine::DEFAULT_GROUP;
use jobhands_store::{JobDataMap, JobRecord};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Body of `POST /jobs`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    /// Record ID; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default = "default_group")]
    pub group: String,
    pub job_class: String,
    #[serde(default)]
    pub data: JobDataMap,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub triggers: Vec<TriggerInfo>,
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

impl CreateJobRequest {
    /// Split into a record and its trigger definitions.
    pub fn into_parts(self) -> Result<(JobRecord, Vec<TriggerInfo>), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("name cannot be empty".to_string()));
        }
        if self.job_class.trim().is_empty() {
            return Err(ApiError::BadRequest("job_class cannot be empty".to_string()));
        }
        let mut record = JobRecord::new(self.name, self.group, self.job_class);
        if let Some(id) = self.id {
            record = record.with_id(id);
        }
        record.data = self.data;
        record.description = self.description;
        Ok((record, self.triggers))
    }
}

/// Response for listing jobs.
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub count: usize,
    pub jobs: Vec<JobView>,
}

/// Response for listing a job's triggers.
#[derive(Debug, Serialize)]
pub struct TriggerListResponse {
    pub count: usize,
    pub triggers: Vec<TriggerView>,
}

/// Response for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub scheduler_started: bool,
    pub scheduled_jobs: usize,
}
