//! Job definitions and the handler trait executed on every fire.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::key::{JobKey, TriggerKey};

/// Arbitrary key/value data passed to a job execution.
pub type JobDataMap = HashMap<String, serde_json::Value>;

/// Error returned by a job handler.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct JobError(pub String);

impl JobError {
    /// Create a new job error.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Execution context handed to a job handler.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Unique ID of this execution.
    pub fire_instance_id: Uuid,
    /// Job being executed.
    pub job_key: JobKey,
    /// Trigger that fired, if any (manual fires have none).
    pub trigger_key: Option<TriggerKey>,
    /// Time the fire was scheduled for.
    pub scheduled_fire_time: DateTime<Utc>,
    /// Time the fire actually happened.
    pub fire_time: DateTime<Utc>,
    /// Job data.
    pub data: JobDataMap,
}

/// Executable unit behind a job.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Execute one fire of the job.
    async fn execute(&self, ctx: JobContext) -> Result<(), JobError>;
}

/// Engine-native job definition.
#[derive(Clone)]
pub struct JobDetail {
    /// Job key.
    pub key: JobKey,
    /// Reference the handler was resolved from.
    pub job_class: String,
    /// Optional description.
    pub description: Option<String>,
    /// Data passed to every execution.
    pub data: JobDataMap,
    /// Durable jobs stay scheduled after their last trigger retires.
    pub durable: bool,
    /// Handler executed on fire.
    pub handler: Arc<dyn JobHandler>,
}

impl JobDetail {
    /// Create a new job detail.
    pub fn new(key: JobKey, job_class: impl Into<String>, handler: Arc<dyn JobHandler>) -> Self {
        Self {
            key,
            job_class: job_class.into(),
            description: None,
            data: JobDataMap::new(),
            durable: false,
            handler,
        }
    }

    /// Add a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the job data.
    pub fn with_data(mut self, data: JobDataMap) -> Self {
        self.data = data;
        self
    }

    /// Set durability.
    pub fn with_durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }
}

impl fmt::Debug for JobDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDetail")
            .field("key", &self.key)
            .field("job_class", &self.job_class)
            .field("description", &self.description)
            .field("data", &self.data)
            .field("durable", &self.durable)
            .finish_non_exhaustive()
    }
}
