//! # JobHands API
//!
//! HTTP surface over the job control service:
//! - **Jobs**: CRUD over stored job records plus schedule/pause/resume/fire actions
//! - **Monitoring**: health, scheduler metrics and recent fire events

pub mod dto;
pub mod error;
pub mod jobs;
pub mod monitoring;
pub mod routes;
pub mod server;
pub mod state;

pub use dto::{CreateJobRequest, HealthResponse, JobListResponse, TriggerListResponse};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::{ApiServer, ApiServerConfig};
pub use state::ApiState;
