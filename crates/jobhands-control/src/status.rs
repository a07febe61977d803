//! Live schedule status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Schedule status of a job or trigger, computed from the engine on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    /// Not known to the engine.
    Unscheduled,
    /// Known to the engine with every trigger paused.
    Paused,
    /// Known to the engine and firing.
    Active,
}

impl ScheduleStatus {
    /// Derive a status from the engine's scheduled/paused answers.
    pub fn from_flags(scheduled: bool, paused: bool) -> Self {
        match (scheduled, paused) {
            (false, _) => ScheduleStatus::Unscheduled,
            (true, true) => ScheduleStatus::Paused,
            (true, false) => ScheduleStatus::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Unscheduled => "UNSCHEDULED",
            ScheduleStatus::Paused => "PAUSED",
            ScheduleStatus::Active => "ACTIVE",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
