//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum concurrent job executions.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Lateness after which a fire counts as a misfire.
    #[serde(default = "default_misfire_threshold_ms")]
    pub misfire_threshold_ms: u64,

    /// Longest sleep of the dispatch loop when nothing is due.
    #[serde(default = "default_idle_wait_ms")]
    pub idle_wait_ms: u64,

    /// Recent fire events kept for `/scheduler/events`.
    #[serde(default = "default_event_history")]
    pub event_history: usize,

    /// Schedule every stored job on boot.
    #[serde(default = "default_true")]
    pub schedule_on_startup: bool,

    /// Store a record for every registered job that has none.
    #[serde(default = "default_true")]
    pub sync_registered_jobs: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            misfire_threshold_ms: default_misfire_threshold_ms(),
            idle_wait_ms: default_idle_wait_ms(),
            event_history: default_event_history(),
            schedule_on_startup: true,
            sync_registered_jobs: true,
        }
    }
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

fn default_true() -> bool {
    true
}

/// Record store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Record store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database file for the SQLite backend; `~` is expanded.
    #[serde(default)]
    pub path: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON instead of human-readable lines.
    #[serde(default)]
    pub json: bool,

    /// Also write daily-rolling log files into this directory.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
