//! API error type and HTTP status mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jobhands_control::ControlError;
use jobhands_store::StoreError;
use thiserror::Error;
use tracing::error;

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Control(e) => match e {
                ControlError::NotFound(_) => StatusCode::NOT_FOUND,
                ControlError::InvalidSchedule(_) => StatusCode::BAD_REQUEST,
                ControlError::Resolution(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ControlError::Store(
                    StoreError::Duplicate { .. } | StoreError::DuplicateTrigger { .. },
                ) => StatusCode::CONFLICT,
                ControlError::Store(_) | ControlError::Registry(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

/// Result type for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;
