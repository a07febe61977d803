//! Engine metrics and recent fire events.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::key::{JobKey, TriggerKey};

/// Scheduler engine counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Fires handed to the worker pool.
    pub fired: AtomicU64,

    /// Executions that returned `Ok`.
    pub completed: AtomicU64,

    /// Executions that returned an error or panicked.
    pub failed: AtomicU64,

    /// Fires skipped because the previous execution was still running.
    pub skipped: AtomicU64,

    /// Fires that ran later than the misfire threshold.
    pub misfired: AtomicU64,

    /// Triggers retired after their last fire.
    pub retired: AtomicU64,

    /// Executions currently in flight.
    pub active: AtomicU64,

    start_time: RwLock<Option<Instant>>,
}

impl EngineMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of the dispatch loop.
    pub fn mark_start(&self) {
        *self.start_time.write() = Some(Instant::now());
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time
            .read()
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    pub(crate) fn record_fired(&self) {
        self.fired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_misfired(&self) {
        self.misfired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retired(&self) {
        self.retired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_started(&self) {
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_finished(&self, success: bool) {
        self.active.fetch_sub(1, Ordering::Relaxed);
        if success {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get a snapshot of the metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fired: self.fired.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            misfired: self.misfired.load(Ordering::Relaxed),
            retired: self.retired.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
            uptime_secs: self.uptime_secs(),
        }
    }
}

/// Point-in-time copy of [`EngineMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub fired: u64,
    pub completed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub misfired: u64,
    pub retired: u64,
    pub active: u64,
    pub uptime_secs: u64,
}

/// What happened to a fire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FireEventKind {
    /// Handler returned `Ok`.
    Completed { duration_ms: u64 },
    /// Handler returned an error or panicked.
    Failed { error: String },
    /// Fire dropped because the job was still running.
    Skipped,
    /// Fire ran late; carries the slot it was scheduled for.
    Misfired { scheduled: DateTime<Utc> },
    /// Trigger will never fire again.
    Retired,
}

/// A recorded fire outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireEvent {
    pub at: DateTime<Utc>,
    pub job_key: JobKey,
    pub trigger_key: Option<TriggerKey>,
    #[serde(flatten)]
    pub kind: FireEventKind,
}

/// Bounded ring of recent fire events, oldest first.
#[derive(Debug)]
pub struct EventLog {
    capacity: usize,
    events: Mutex<VecDeque<FireEvent>>,
}

impl EventLog {
    /// Create an event log holding at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    pub(crate) fn record(
        &self,
        job_key: &JobKey,
        trigger_key: Option<&TriggerKey>,
        kind: FireEventKind,
    ) {
        if self.capacity == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(FireEvent {
            at: Utc::now(),
            job_key: job_key.clone(),
            trigger_key: trigger_key.cloned(),
            kind,
        });
    }

    /// Copy of the recorded events.
    pub fn recent(&self) -> Vec<FireEvent> {
        self.events.lock().iter().cloned().collect()
    }
}
