//! Error types for the control layer.

use jobhands_store::StoreError;
use thiserror::Error;

/// Errors returned by [`JobControlService`](crate::JobControlService) and
/// [`JobInfoProvider`](crate::JobInfoProvider) implementations.
///
/// Scheduler engine failures are not represented here: the service logs them
/// and reports `false` instead.
#[derive(Debug, Error)]
pub enum ControlError {
    /// No job record with the given ID.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// The job class reference is not registered.
    #[error("Cannot resolve job class: {0}")]
    Resolution(String),

    /// A trigger definition cannot be turned into a live trigger.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// The record store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Handler registration failed.
    #[error("Registry error: {0}")]
    Registry(String),
}

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;
