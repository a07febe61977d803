//! Error types for the scheduler engine.

use thiserror::Error;

use crate::key::{JobKey, TriggerKey};

/// Errors returned by [`SchedulerEngine`](crate::SchedulerEngine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The job is already scheduled and replacement was not requested.
    #[error("Job already scheduled: {0}")]
    AlreadyScheduled(JobKey),

    /// The trigger key is already owned by another job.
    #[error("Trigger already scheduled: {0}")]
    TriggerAlreadyScheduled(TriggerKey),

    /// The job is not scheduled.
    #[error("Job not found: {0}")]
    JobNotFound(JobKey),

    /// The trigger is not scheduled.
    #[error("Trigger not found: {0}")]
    TriggerNotFound(TriggerKey),

    /// Malformed cron expression, interval or time window.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// A non-durable job was scheduled without triggers.
    #[error("Job {0} has no triggers and is not durable")]
    NoTriggers(JobKey),

    /// A trigger references a different job than the one being scheduled.
    #[error("Trigger {trigger} belongs to {actual}, not {expected}")]
    TriggerJobMismatch {
        trigger: TriggerKey,
        expected: JobKey,
        actual: JobKey,
    },

    /// The engine has already been started.
    #[error("Scheduler engine is already started")]
    AlreadyStarted,

    /// The engine has been shut down.
    #[error("Scheduler engine is shut down")]
    ShutDown,
}

impl EngineError {
    /// Whether the error reports a missing job or trigger.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::JobNotFound(_) | EngineError::TriggerNotFound(_))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
