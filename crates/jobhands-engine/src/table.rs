//! Job and trigger table.
//!
//! The table is plain data. The engine wraps it in a `parking_lot::RwLock`
//! and every mutation below runs inside a single write-lock section.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::job::JobDetail;
use crate::key::{JobKey, TriggerKey};
use crate::trigger::Trigger;

pub(crate) struct ScheduledJob {
    pub(crate) detail: JobDetail,
    pub(crate) triggers: Vec<TriggerKey>,
    pub(crate) running: Arc<AtomicBool>,
}

pub(crate) struct ScheduledTrigger {
    pub(crate) trigger: Trigger,
    pub(crate) next_fire_time: Option<DateTime<Utc>>,
    pub(crate) previous_fire_time: Option<DateTime<Utc>>,
    pub(crate) times_triggered: u64,
    pub(crate) paused: bool,
}

/// Point-in-time view of a live trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerState {
    /// Trigger key.
    pub key: TriggerKey,
    /// Next scheduled fire time.
    pub next_fire_time: Option<DateTime<Utc>>,
    /// Scheduled time of the last fire.
    pub previous_fire_time: Option<DateTime<Utc>>,
    /// Fires so far, skipped fires included.
    pub times_triggered: u64,
    /// Whether the trigger is paused.
    pub paused: bool,
    /// Trigger priority.
    pub priority: i32,
}

/// A fire taken off the table, ready for the worker pool.
pub(crate) struct Firing {
    pub(crate) job: JobDetail,
    pub(crate) trigger_key: Option<TriggerKey>,
    pub(crate) scheduled_fire_time: DateTime<Utc>,
    pub(crate) misfired: bool,
    pub(crate) running: Arc<AtomicBool>,
}

/// A trigger removed because it will never fire again.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Retirement {
    pub(crate) trigger_key: TriggerKey,
    pub(crate) job_key: JobKey,
    pub(crate) job_removed: bool,
}

#[derive(Default)]
pub(crate) struct DueBatch {
    pub(crate) firings: Vec<Firing>,
    pub(crate) retired: Vec<Retirement>,
}

#[derive(Default)]
pub(crate) struct JobTable {
    jobs: HashMap<JobKey, ScheduledJob>,
    triggers: HashMap<TriggerKey, ScheduledTrigger>,
}

impl JobTable {
    /// Register a job with its triggers.
    ///
    /// Everything is validated before the table changes, so a failed insert
    /// leaves existing entries untouched.
    pub(crate) fn insert(
        &mut self,
        detail: JobDetail,
        triggers: Vec<Trigger>,
        replace_existing: bool,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let job_key = detail.key.clone();
        if self.jobs.contains_key(&job_key) && !replace_existing {
            return Err(EngineError::AlreadyScheduled(job_key));
        }
        if triggers.is_empty() && !detail.durable {
            return Err(EngineError::NoTriggers(job_key));
        }

        let mut seen = HashSet::new();
        let mut first_fire_times = Vec::with_capacity(triggers.len());
        for trigger in &triggers {
            if trigger.job_key != job_key {
                return Err(EngineError::TriggerJobMismatch {
                    trigger: trigger.key.clone(),
                    expected: job_key,
                    actual: trigger.job_key.clone(),
                });
            }
            let owned_elsewhere = self
                .triggers
                .get(&trigger.key)
                .is_some_and(|existing| existing.trigger.job_key != job_key);
            if owned_elsewhere || !seen.insert(trigger.key.clone()) {
                return Err(EngineError::TriggerAlreadyScheduled(trigger.key.clone()));
            }
            let first = trigger.first_fire_time(now).ok_or_else(|| {
                EngineError::InvalidSchedule(format!("trigger {} will never fire", trigger.key))
            })?;
            first_fire_times.push(first);
        }

        let running = match self.jobs.remove(&job_key) {
            Some(previous) => {
                for key in &previous.triggers {
                    self.triggers.remove(key);
                }
                previous.running
            }
            None => Arc::new(AtomicBool::new(false)),
        };

        let keys = triggers.iter().map(|t| t.key.clone()).collect();
        for (trigger, first) in triggers.into_iter().zip(first_fire_times) {
            self.triggers.insert(
                trigger.key.clone(),
                ScheduledTrigger {
                    trigger,
                    next_fire_time: Some(first),
                    previous_fire_time: None,
                    times_triggered: 0,
                    paused: false,
                },
            );
        }
        self.jobs.insert(
            job_key,
            ScheduledJob {
                detail,
                triggers: keys,
                running,
            },
        );
        Ok(())
    }

    /// Remove a job and its triggers. Returns whether the job existed.
    pub(crate) fn remove(&mut self, job_key: &JobKey) -> bool {
        match self.jobs.remove(job_key) {
            Some(job) => {
                for key in &job.triggers {
                    self.triggers.remove(key);
                }
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_job_paused(&mut self, job_key: &JobKey, paused: bool) -> EngineResult<()> {
        let job = self
            .jobs
            .get(job_key)
            .ok_or_else(|| EngineError::JobNotFound(job_key.clone()))?;
        for key in &job.triggers {
            if let Some(trigger) = self.triggers.get_mut(key) {
                trigger.paused = paused;
            }
        }
        Ok(())
    }

    pub(crate) fn set_trigger_paused(
        &mut self,
        trigger_key: &TriggerKey,
        paused: bool,
    ) -> EngineResult<()> {
        let trigger = self
            .triggers
            .get_mut(trigger_key)
            .ok_or_else(|| EngineError::TriggerNotFound(trigger_key.clone()))?;
        trigger.paused = paused;
        Ok(())
    }

    pub(crate) fn contains_job(&self, job_key: &JobKey) -> bool {
        self.jobs.contains_key(job_key)
    }

    /// A job is paused when it has at least one trigger and all are paused.
    pub(crate) fn is_job_paused(&self, job_key: &JobKey) -> bool {
        self.jobs.get(job_key).is_some_and(|job| {
            !job.triggers.is_empty()
                && job
                    .triggers
                    .iter()
                    .all(|key| self.triggers.get(key).is_some_and(|t| t.paused))
        })
    }

    pub(crate) fn contains_trigger(&self, trigger_key: &TriggerKey) -> bool {
        self.triggers.contains_key(trigger_key)
    }

    pub(crate) fn is_trigger_paused(&self, trigger_key: &TriggerKey) -> bool {
        self.triggers.get(trigger_key).is_some_and(|t| t.paused)
    }

    pub(crate) fn job_keys(&self) -> Vec<JobKey> {
        let mut keys: Vec<_> = self.jobs.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub(crate) fn trigger_states(&self, job_key: &JobKey) -> EngineResult<Vec<TriggerState>> {
        let job = self
            .jobs
            .get(job_key)
            .ok_or_else(|| EngineError::JobNotFound(job_key.clone()))?;
        Ok(job
            .triggers
            .iter()
            .filter_map(|key| {
                self.triggers.get(key).map(|t| TriggerState {
                    key: key.clone(),
                    next_fire_time: t.next_fire_time,
                    previous_fire_time: t.previous_fire_time,
                    times_triggered: t.times_triggered,
                    paused: t.paused,
                    priority: t.trigger.priority,
                })
            })
            .collect())
    }

    /// Build a fire for a manual trigger of a scheduled job.
    pub(crate) fn manual_firing(&self, job_key: &JobKey, now: DateTime<Utc>) -> Option<Firing> {
        self.jobs.get(job_key).map(|job| Firing {
            job: job.detail.clone(),
            trigger_key: None,
            scheduled_fire_time: now,
            misfired: false,
            running: Arc::clone(&job.running),
        })
    }

    /// Running flag shared by every execution of a scheduled job.
    pub(crate) fn running_flag(&self, job_key: &JobKey) -> Option<Arc<AtomicBool>> {
        self.jobs.get(job_key).map(|job| Arc::clone(&job.running))
    }

    /// Whether an execution of the job is in flight.
    pub(crate) fn is_job_running(&self, job_key: &JobKey) -> bool {
        self.jobs
            .get(job_key)
            .is_some_and(|job| job.running.load(Ordering::SeqCst))
    }

    /// Take every due, non-paused trigger off the table.
    ///
    /// Due triggers are processed in (fire time, priority desc) order. Each is
    /// advanced to its next slot or retired. A fire late by more than
    /// `misfire_threshold` is flagged as a misfire and its trigger skips
    /// straight to the first slot after `now`. A due trigger whose end time
    /// has passed by `now` is retired without firing.
    pub(crate) fn take_due(&mut self, now: DateTime<Utc>, misfire_threshold: Duration) -> DueBatch {
        let threshold = TimeDelta::from_std(misfire_threshold).unwrap_or(TimeDelta::MAX);

        let mut due: Vec<(DateTime<Utc>, i32, TriggerKey)> = self
            .triggers
            .iter()
            .filter(|(_, t)| !t.paused)
            .filter_map(|(key, t)| {
                t.next_fire_time
                    .filter(|at| *at <= now)
                    .map(|at| (at, t.trigger.priority, key.clone()))
            })
            .collect();
        due.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut batch = DueBatch::default();
        for (scheduled, _, key) in due {
            let Some(live) = self.triggers.get_mut(&key) else {
                continue;
            };
            if live.trigger.has_ended(now) {
                let job_key = live.trigger.job_key.clone();
                batch.retired.push(self.retire(&key, &job_key));
                continue;
            }
            let misfired = now - scheduled > threshold;
            live.times_triggered += 1;
            live.previous_fire_time = Some(scheduled);
            let not_before = if misfired { now } else { scheduled };
            live.next_fire_time =
                live.trigger
                    .next_fire_time(scheduled, live.times_triggered, not_before);
            let exhausted = live.next_fire_time.is_none();
            let job_key = live.trigger.job_key.clone();

            if let Some(job) = self.jobs.get(&job_key) {
                batch.firings.push(Firing {
                    job: job.detail.clone(),
                    trigger_key: Some(key.clone()),
                    scheduled_fire_time: scheduled,
                    misfired,
                    running: Arc::clone(&job.running),
                });
            }
            if exhausted {
                batch.retired.push(self.retire(&key, &job_key));
            }
        }
        batch
    }

    fn retire(&mut self, trigger_key: &TriggerKey, job_key: &JobKey) -> Retirement {
        self.triggers.remove(trigger_key);
        let mut job_removed = false;
        if let Some(job) = self.jobs.get_mut(job_key) {
            job.triggers.retain(|k| k != trigger_key);
            if job.triggers.is_empty() && !job.detail.durable {
                self.jobs.remove(job_key);
                job_removed = true;
            }
        }
        Retirement {
            trigger_key: trigger_key.clone(),
            job_key: job_key.clone(),
            job_removed,
        }
    }

    /// Earliest next fire time over all non-paused triggers.
    pub(crate) fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        self.triggers
            .values()
            .filter(|t| !t.paused)
            .filter_map(|t| t.next_fire_time)
            .min()
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
