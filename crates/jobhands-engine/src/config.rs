//! Scheduler engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scheduler engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of concurrent job executions.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Lateness after which a fire counts as a misfire (milliseconds).
    #[serde(default = "default_misfire_threshold_ms")]
    pub misfire_threshold_ms: u64,

    /// Longest the dispatch loop sleeps when nothing is due (milliseconds).
    #[serde(default = "default_idle_wait_ms")]
    pub idle_wait_ms: u64,

    /// Number of recent fire events kept for inspection.
    #[serde(default = "default_event_history")]
    pub event_history: usize,
}

fn default_max_workers() -> usize {
    10
}

fn default_misfire_threshold_ms() -> u64 {
    60_000
}

fn default_idle_wait_ms() -> u64 {
    30_000
}

fn default_event_history() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            misfire_threshold_ms: default_misfire_threshold_ms(),
            idle_wait_ms: default_idle_wait_ms(),
            event_history: default_event_history(),
        }
    }
}

impl EngineConfig {
    /// Set the worker count.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the misfire threshold.
    pub fn with_misfire_threshold(mut self, threshold: Duration) -> Self {
        self.misfire_threshold_ms = threshold.as_millis() as u64;
        self
    }

    /// Misfire threshold as a duration.
    pub fn misfire_threshold(&self) -> Duration {
        Duration::from_millis(self.misfire_threshold_ms)
    }

    /// Idle wait as a duration.
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }
}
