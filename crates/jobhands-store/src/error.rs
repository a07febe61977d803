//! Store errors.

use thiserror::Error;

/// Store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced record does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A job with the same (name, group) pair is already stored.
    #[error("Duplicate job record: {group}.{name}")]
    Duplicate { name: String, group: String },

    /// A trigger with the same (name, group) pair is already stored.
    #[error("Duplicate trigger record: {group}.{name}")]
    DuplicateTrigger { name: String, group: String },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(e: tokio_rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}
