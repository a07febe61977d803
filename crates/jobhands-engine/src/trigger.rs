//! Trigger definitions and fire time computation.
//!
//! Fire times are computed by pure functions of the trigger definition, the
//! previously scheduled time and a lower bound, so they can be tested without
//! a running engine.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use cron::Schedule;

use crate::error::{EngineError, EngineResult};
use crate::key::{JobKey, TriggerKey};

/// Priority used when none is given.
pub const DEFAULT_PRIORITY: i32 = 5;

/// How a trigger computes its fire times.
#[derive(Clone)]
pub enum TriggerSchedule {
    /// Cron expression, six or seven fields with seconds first.
    Cron {
        /// Normalized expression.
        expression: String,
        /// Parsed schedule.
        schedule: Schedule,
    },
    /// Fixed interval.
    Simple {
        /// Time between fires.
        interval: Duration,
        /// Repeats after the first fire; `None` repeats forever.
        repeat_count: Option<u32>,
    },
}

impl fmt::Debug for TriggerSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSchedule::Cron { expression, .. } => {
                f.debug_struct("Cron").field("expression", expression).finish()
            }
            TriggerSchedule::Simple {
                interval,
                repeat_count,
            } => f
                .debug_struct("Simple")
                .field("interval", interval)
                .field("repeat_count", repeat_count)
                .finish(),
        }
    }
}

/// Engine-native trigger.
#[derive(Debug, Clone)]
pub struct Trigger {
    /// Trigger key.
    pub key: TriggerKey,
    /// Job this trigger fires.
    pub job_key: JobKey,
    /// Schedule rule.
    pub schedule: TriggerSchedule,
    /// Earliest fire time; `None` means when scheduled.
    pub start_time: Option<DateTime<Utc>>,
    /// No fire happens after this instant.
    pub end_time: Option<DateTime<Utc>>,
    /// Higher priority fires first among triggers due at the same instant.
    pub priority: i32,
}

/// Rewrite a cron expression into the form the `cron` crate parses.
///
/// Accepts Quartz-style `?` and classic five-field expressions (seconds
/// default to `0`).
pub fn normalize_cron(expression: &str) -> String {
    let mut fields: Vec<&str> = expression
        .split_whitespace()
        .map(|field| if field == "?" { "*" } else { field })
        .collect();
    if fields.len() == 5 {
        fields.insert(0, "0");
    }
    fields.join(" ")
}

impl Trigger {
    /// Create a cron trigger.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSchedule`] if the expression does not parse.
    pub fn cron(key: TriggerKey, job_key: JobKey, expression: &str) -> EngineResult<Self> {
        let expression = normalize_cron(expression);
        let schedule = Schedule::from_str(&expression).map_err(|e| {
            EngineError::InvalidSchedule(format!("cron expression '{}': {}", expression, e))
        })?;
        Ok(Self {
            key,
            job_key,
            schedule: TriggerSchedule::Cron {
                expression,
                schedule,
            },
            start_time: None,
            end_time: None,
            priority: DEFAULT_PRIORITY,
        })
    }

    /// Create a fixed-interval trigger.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSchedule`] if the interval is zero or
    /// shorter than one millisecond.
    pub fn simple(
        key: TriggerKey,
        job_key: JobKey,
        interval: Duration,
        repeat_count: Option<u32>,
    ) -> EngineResult<Self> {
        if interval.as_millis() == 0 {
            return Err(EngineError::InvalidSchedule(format!(
                "trigger {}: repeat interval must be at least 1ms",
                key
            )));
        }
        Ok(Self {
            key,
            job_key,
            schedule: TriggerSchedule::Simple {
                interval,
                repeat_count,
            },
            start_time: None,
            end_time: None,
            priority: DEFAULT_PRIORITY,
        })
    }

    /// Restrict the fire window.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSchedule`] if `end` precedes `start`.
    pub fn with_window(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> EngineResult<Self> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(EngineError::InvalidSchedule(format!(
                    "trigger {}: end time {} is before start time {}",
                    self.key, end, start
                )));
            }
        }
        self.start_time = start;
        self.end_time = end;
        Ok(self)
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Cron expression, if this is a cron trigger.
    pub fn cron_expression(&self) -> Option<&str> {
        match &self.schedule {
            TriggerSchedule::Cron { expression, .. } => Some(expression),
            TriggerSchedule::Simple { .. } => None,
        }
    }

    /// First fire time at or after the start time (or `now` when unset).
    ///
    /// Returns `None` when the trigger can never fire, including when its
    /// end time has already passed.
    pub fn first_fire_time(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.has_ended(now) {
            return None;
        }
        let start = self.start_time.unwrap_or(now);
        let first = match &self.schedule {
            TriggerSchedule::Cron { schedule, .. } => schedule
                .after(&(start - TimeDelta::seconds(1)))
                .find(|t| *t >= start),
            TriggerSchedule::Simple { .. } => Some(start),
        };
        first.filter(|t| self.within_window(*t))
    }

    /// Next fire time after a fire that was scheduled for `scheduled`.
    ///
    /// `times_triggered` counts fires including the one at `scheduled`. The
    /// result is the first regular slot strictly after `not_before` (pass
    /// `scheduled` to step one slot, `now` to skip missed slots). Returns
    /// `None` when the trigger is exhausted or past its end time.
    pub fn next_fire_time(
        &self,
        scheduled: DateTime<Utc>,
        times_triggered: u64,
        not_before: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let next = match &self.schedule {
            TriggerSchedule::Cron { schedule, .. } => {
                schedule.after(&not_before.max(scheduled)).next()
            }
            TriggerSchedule::Simple {
                interval,
                repeat_count,
            } => {
                if let Some(repeat) = repeat_count {
                    if times_triggered > u64::from(*repeat) {
                        return None;
                    }
                }
                let step = i64::try_from(interval.as_millis()).ok()?.max(1);
                let elapsed = (not_before - scheduled).num_milliseconds().max(0);
                let slots = elapsed / step + 1;
                scheduled.checked_add_signed(TimeDelta::milliseconds(slots.checked_mul(step)?))
            }
        };
        next.filter(|t| self.within_window(*t))
    }

    /// Whether the end time lies before `now`.
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time.is_some_and(|end| now > end)
    }

    fn within_window(&self, at: DateTime<Utc>) -> bool {
        self.end_time.is_none_or(|end| at <= end)
    }
}
