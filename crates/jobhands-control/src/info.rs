//! Runtime job and trigger descriptions.
//!
//! [`JobInfo`] and [`TriggerInfo`] are built on demand from persisted records
//! or registration defaults and are never stored themselves.

use chrono::{DateTime, Utc};
use jobhands_engine::{DEFAULT_PRIORITY, JobKey, TriggerKey};
use jobhands_store::{JobDataMap, JobRecord, TriggerRecord, TriggerType};
use serde::{Deserialize, Serialize};

/// Runtime trigger description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerInfo {
    pub name: String,
    pub group: String,
    pub kind: TriggerType,
    #[serde(default)]
    pub cron_expression: Option<String>,
    #[serde(default)]
    pub repeat_interval_ms: Option<u64>,
    #[serde(default)]
    pub repeat_count: Option<u32>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl TriggerInfo {
    fn base(name: impl Into<String>, group: impl Into<String>, kind: TriggerType) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            kind,
            cron_expression: None,
            repeat_interval_ms: None,
            repeat_count: None,
            start_time: None,
            end_time: None,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Cron trigger.
    pub fn cron(name: impl Into<String>, group: impl Into<String>, expression: impl Into<String>) -> Self {
        let mut info = Self::base(name, group, TriggerType::Cron);
        info.cron_expression = Some(expression.into());
        info
    }

    /// Fixed-interval trigger.
    pub fn simple(
        name: impl Into<String>,
        group: impl Into<String>,
        repeat_interval_ms: u64,
        repeat_count: Option<u32>,
    ) -> Self {
        let mut info = Self::base(name, group, TriggerType::Simple);
        info.repeat_interval_ms = Some(repeat_interval_ms);
        info.repeat_count = repeat_count;
        info
    }

    /// Startup or shutdown trigger.
    pub fn lifecycle(name: impl Into<String>, group: impl Into<String>, kind: TriggerType) -> Self {
        Self::base(name, group, kind)
    }

    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Engine key for this trigger.
    pub fn trigger_key(&self) -> TriggerKey {
        TriggerKey::new(&self.name, &self.group)
    }

    /// Build from a stored record.
    pub fn from_record(record: &TriggerRecord) -> Self {
        Self {
            name: record.name.clone(),
            group: record.group.clone(),
            kind: record.trigger_type,
            cron_expression: record.cron_expression.clone(),
            repeat_interval_ms: record.repeat_interval_ms,
            repeat_count: record.repeat_count,
            start_time: record.start_time,
            end_time: record.end_time,
            priority: record.priority,
        }
    }

    /// Build a record owned by `job_id`, with a fresh record ID.
    pub fn to_record(&self, job_id: &str) -> TriggerRecord {
        let mut record = TriggerRecord::lifecycle(&self.name, &self.group, job_id, self.kind);
        record.cron_expression = self.cron_expression.clone();
        record.repeat_interval_ms = self.repeat_interval_ms;
        record.repeat_count = self.repeat_count;
        record.start_time = self.start_time;
        record.end_time = self.end_time;
        record.priority = self.priority;
        record
    }
}

/// Runtime job description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobInfo {
    pub name: String,
    pub group: String,
    pub job_class: String,
    pub description: Option<String>,
    pub data: JobDataMap,
    /// Triggers in declaration order.
    pub triggers: Vec<TriggerInfo>,
}

impl JobInfo {
    /// Build from a stored record and its triggers.
    pub fn from_record(record: &JobRecord, triggers: Vec<TriggerInfo>) -> Self {
        Self {
            name: record.name.clone(),
            group: record.group.clone(),
            job_class: record.job_class.clone(),
            description: record.description.clone(),
            data: record.data.clone(),
            triggers,
        }
    }

    /// Engine key for this job.
    pub fn job_key(&self) -> JobKey {
        JobKey::new(&self.name, &self.group)
    }

    /// Triggers the live scheduler can run.
    pub fn schedulable_triggers(&self) -> impl Iterator<Item = &TriggerInfo> {
        self.triggers.iter().filter(|t| t.kind.is_schedulable())
    }

    /// Whether any trigger is of the given kind.
    pub fn has_trigger_kind(&self, kind: TriggerType) -> bool {
        self.triggers.iter().any(|t| t.kind == kind)
    }
}
