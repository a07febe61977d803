//! Job and trigger records.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Arbitrary key/value data attached to a job.
pub type JobDataMap = HashMap<String, serde_json::Value>;

/// Default trigger priority.
pub const DEFAULT_PRIORITY: i32 = 5;

/// Persisted job definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique record ID.
    pub id: String,
    /// Job name.
    pub name: String,
    /// Job group.
    pub group: String,
    /// Reference to the executable unit (resolved through the job registry).
    pub job_class: String,
    /// Job data passed to every execution.
    #[serde(default)]
    pub data: JobDataMap,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

impl JobRecord {
    /// Create a new job record with a generated ID.
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        job_class: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            group: group.into(),
            job_class: job_class.into(),
            data: JobDataMap::new(),
            description: None,
        }
    }

    /// Use a specific record ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Add a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a data entry.
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// Trigger type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    /// Cron expression schedule.
    Cron,
    /// Fixed interval schedule.
    Simple,
    /// Run once when the service starts.
    OnStartup,
    /// Run once when the service stops.
    OnShutdown,
}

impl TriggerType {
    /// Stable string form, used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Cron => "CRON",
            TriggerType::Simple => "SIMPLE",
            TriggerType::OnStartup => "ON_STARTUP",
            TriggerType::OnShutdown => "ON_SHUTDOWN",
        }
    }

    /// Whether triggers of this type go through the live scheduler.
    pub fn is_schedulable(&self) -> bool {
        matches!(self, TriggerType::Cron | TriggerType::Simple)
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CRON" => Ok(TriggerType::Cron),
            "SIMPLE" => Ok(TriggerType::Simple),
            "ON_STARTUP" => Ok(TriggerType::OnStartup),
            "ON_SHUTDOWN" => Ok(TriggerType::OnShutdown),
            other => Err(format!("unknown trigger type: {}", other)),
        }
    }
}

/// Persisted trigger definition, owned by a job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRecord {
    /// Unique record ID.
    pub id: String,
    /// Trigger name.
    pub name: String,
    /// Trigger group.
    pub group: String,
    /// Owning job record ID.
    pub job_id: String,
    /// Trigger type.
    pub trigger_type: TriggerType,
    /// Cron expression (CRON triggers).
    #[serde(default)]
    pub cron_expression: Option<String>,
    /// Repeat interval in milliseconds (SIMPLE triggers).
    #[serde(default)]
    pub repeat_interval_ms: Option<u64>,
    /// Number of repeats after the first fire; `None` repeats forever.
    #[serde(default)]
    pub repeat_count: Option<u32>,
    /// Earliest fire time; `None` means "when scheduled".
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Latest fire time.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Priority among triggers due at the same instant (higher first).
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl TriggerRecord {
    fn base(
        name: impl Into<String>,
        group: impl Into<String>,
        job_id: impl Into<String>,
        trigger_type: TriggerType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            group: group.into(),
            job_id: job_id.into(),
            trigger_type,
            cron_expression: None,
            repeat_interval_ms: None,
            repeat_count: None,
            start_time: None,
            end_time: None,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Create a cron trigger record.
    pub fn cron(
        name: impl Into<String>,
        group: impl Into<String>,
        job_id: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        let mut record = Self::base(name, group, job_id, TriggerType::Cron);
        record.cron_expression = Some(expression.into());
        record
    }

    /// Create a fixed-interval trigger record.
    pub fn simple(
        name: impl Into<String>,
        group: impl Into<String>,
        job_id: impl Into<String>,
        repeat_interval_ms: u64,
        repeat_count: Option<u32>,
    ) -> Self {
        let mut record = Self::base(name, group, job_id, TriggerType::Simple);
        record.repeat_interval_ms = Some(repeat_interval_ms);
        record.repeat_count = repeat_count;
        record
    }

    /// Create a lifecycle trigger record (`ON_STARTUP` / `ON_SHUTDOWN`).
    pub fn lifecycle(
        name: impl Into<String>,
        group: impl Into<String>,
        job_id: impl Into<String>,
        trigger_type: TriggerType,
    ) -> Self {
        Self::base(name, group, job_id, trigger_type)
    }

    /// Set the start time.
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Set the end time.
    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}
