//! Read views combining stored records with live schedule state.

use chrono::{DateTime, Utc};
use jobhands_store::{JobRecord, TriggerRecord};
use serde::Serialize;

use crate::status::ScheduleStatus;

/// A stored job with its live status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: JobRecord,
    pub status: ScheduleStatus,
}

/// A stored trigger with its live status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerView {
    #[serde(flatten)]
    pub trigger: TriggerRecord,
    pub status: ScheduleStatus,
    /// Present while the trigger is scheduled.
    pub next_fire_time: Option<DateTime<Utc>>,
    pub previous_fire_time: Option<DateTime<Utc>>,
    pub times_triggered: u64,
}
