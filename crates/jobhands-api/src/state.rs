//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use jobhands_control::JobControlService;

/// State shared by all route handlers.
pub struct ApiState {
    pub service: Arc<JobControlService>,
    started_at: Instant,
}

impl ApiState {
    pub fn new(service: Arc<JobControlService>) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
