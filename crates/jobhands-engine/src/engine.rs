//! SchedulerEngine - in-process job scheduler.
//!
//! The engine is constructed explicitly and injected into its users. It starts
//! in standby: jobs may be scheduled, but nothing fires until [`start`] spawns
//! the dispatch loop. [`shutdown`] stops the loop and optionally drains
//! in-flight executions; every mutation afterwards fails with
//! [`EngineError::ShutDown`].
//!
//! [`start`]: SchedulerEngine::start
//! [`shutdown`]: SchedulerEngine::shutdown

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::dispatch::run_dispatch_loop;
use crate::error::{EngineError, EngineResult};
use crate::job::JobDetail;
use crate::key::{JobKey, TriggerKey};
use crate::metrics::{EngineMetrics, EventLog, FireEvent, MetricsSnapshot};
use crate::table::{Firing, JobTable, TriggerState};
use crate::trigger::Trigger;
use crate::worker::{Submission, WorkerPool};

/// State shared between the engine handle and its dispatch loop.
pub(crate) struct EngineShared {
    pub(crate) config: EngineConfig,
    pub(crate) clock: Clock,
    pub(crate) table: RwLock<JobTable>,
    pub(crate) wakeup: Notify,
    pub(crate) metrics: Arc<EngineMetrics>,
    pub(crate) events: Arc<EventLog>,
    pub(crate) workers: WorkerPool,
}

enum LoopState {
    Standby,
    Running(JoinHandle<()>),
    ShutDown,
}

/// In-process job scheduler.
pub struct SchedulerEngine {
    shared: Arc<EngineShared>,
    state: Mutex<LoopState>,
    cancel: CancellationToken,
    shut_down: AtomicBool,
}

impl SchedulerEngine {
    /// Create an engine in standby.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Clock::System)
    }

    pub(crate) fn with_clock(config: EngineConfig, clock: Clock) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        let events = Arc::new(EventLog::new(config.event_history));
        let workers = WorkerPool::new(
            config.max_workers,
            Arc::clone(&metrics),
            Arc::clone(&events),
            clock,
        );
        Self {
            shared: Arc::new(EngineShared {
                config,
                clock,
                table: RwLock::new(JobTable::default()),
                wakeup: Notify::new(),
                metrics,
                events,
                workers,
            }),
            state: Mutex::new(LoopState::Standby),
            cancel: CancellationToken::new(),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Spawn the dispatch loop. Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyStarted`] if running, [`EngineError::ShutDown`]
    /// after shutdown.
    pub fn start(&self) -> EngineResult<()> {
        let mut state = self.state.lock();
        match *state {
            LoopState::Running(_) => Err(EngineError::AlreadyStarted),
            LoopState::ShutDown => Err(EngineError::ShutDown),
            LoopState::Standby => {
                let handle = tokio::spawn(run_dispatch_loop(
                    Arc::clone(&self.shared),
                    self.cancel.clone(),
                ));
                *state = LoopState::Running(handle);
                info!(
                    max_workers = self.shared.config.max_workers,
                    "Scheduler engine started"
                );
                Ok(())
            }
        }
    }

    /// Whether the dispatch loop is running.
    pub fn is_started(&self) -> bool {
        matches!(*self.state.lock(), LoopState::Running(_))
    }

    /// Whether the engine has been shut down.
    pub fn is_shutdown(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Stop the dispatch loop. Idempotent.
    ///
    /// With `wait_for_jobs`, returns only after in-flight executions finish.
    /// Unscheduled executions are never interrupted.
    pub async fn shutdown(&self, wait_for_jobs: bool) {
        let previous = std::mem::replace(&mut *self.state.lock(), LoopState::ShutDown);
        if matches!(previous, LoopState::ShutDown) {
            return;
        }
        self.shut_down.store(true, Ordering::SeqCst);
        self.cancel.cancel();

        if let LoopState::Running(handle) = previous {
            if let Err(e) = handle.await {
                warn!(error = %e, "Dispatch loop ended abnormally");
            }
        }
        self.shared.workers.close(wait_for_jobs).await;
        info!(wait_for_jobs, "Scheduler engine shut down");
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.is_shutdown() {
            Err(EngineError::ShutDown)
        } else {
            Ok(())
        }
    }

    fn wake(&self) {
        self.shared.wakeup.notify_one();
    }

    /// Register a job and its triggers in one step.
    ///
    /// # Errors
    ///
    /// - [`EngineError::AlreadyScheduled`] if the job exists and
    ///   `replace_existing` is false; the existing triggers are untouched
    /// - [`EngineError::TriggerAlreadyScheduled`] if a trigger key belongs to
    ///   another job
    /// - [`EngineError::TriggerJobMismatch`] if a trigger targets another job
    /// - [`EngineError::NoTriggers`] for a non-durable job without triggers
    /// - [`EngineError::InvalidSchedule`] if a trigger can never fire
    pub fn schedule_job(
        &self,
        detail: JobDetail,
        triggers: Vec<Trigger>,
        replace_existing: bool,
    ) -> EngineResult<()> {
        self.ensure_open()?;
        let job_key = detail.key.clone();
        let trigger_count = triggers.len();
        self.shared
            .table
            .write()
            .insert(detail, triggers, replace_existing, self.shared.clock.now())?;
        self.wake();
        info!(job_key = %job_key, triggers = trigger_count, replace_existing, "Job scheduled");
        Ok(())
    }

    /// Remove a job and all its triggers. Returns `false` if it was absent.
    pub fn unschedule_job(&self, job_key: &JobKey) -> EngineResult<bool> {
        self.ensure_open()?;
        let removed = self.shared.table.write().remove(job_key);
        if removed {
            self.wake();
            info!(job_key = %job_key, "Job unscheduled");
        }
        Ok(removed)
    }

    /// Pause every trigger of a job. Fire times are kept.
    pub fn pause_job(&self, job_key: &JobKey) -> EngineResult<()> {
        self.ensure_open()?;
        self.shared.table.write().set_job_paused(job_key, true)?;
        self.wake();
        info!(job_key = %job_key, "Job paused");
        Ok(())
    }

    /// Resume every trigger of a job. Overdue triggers fire on the next pass.
    pub fn resume_job(&self, job_key: &JobKey) -> EngineResult<()> {
        self.ensure_open()?;
        self.shared.table.write().set_job_paused(job_key, false)?;
        self.wake();
        info!(job_key = %job_key, "Job resumed");
        Ok(())
    }

    /// Pause a single trigger.
    pub fn pause_trigger(&self, trigger_key: &TriggerKey) -> EngineResult<()> {
        self.ensure_open()?;
        self.shared.table.write().set_trigger_paused(trigger_key, true)?;
        self.wake();
        debug!(trigger_key = %trigger_key, "Trigger paused");
        Ok(())
    }

    /// Resume a single trigger.
    pub fn resume_trigger(&self, trigger_key: &TriggerKey) -> EngineResult<()> {
        self.ensure_open()?;
        self.shared.table.write().set_trigger_paused(trigger_key, false)?;
        self.wake();
        debug!(trigger_key = %trigger_key, "Trigger resumed");
        Ok(())
    }

    pub fn is_scheduled_job(&self, job_key: &JobKey) -> bool {
        self.shared.table.read().contains_job(job_key)
    }

    /// A job is paused when it has at least one trigger and all are paused.
    pub fn is_paused_job(&self, job_key: &JobKey) -> bool {
        self.shared.table.read().is_job_paused(job_key)
    }

    pub fn is_scheduled_trigger(&self, trigger_key: &TriggerKey) -> bool {
        self.shared.table.read().contains_trigger(trigger_key)
    }

    pub fn is_paused_trigger(&self, trigger_key: &TriggerKey) -> bool {
        self.shared.table.read().is_trigger_paused(trigger_key)
    }

    /// Whether an execution of the job is in flight.
    pub fn is_job_running(&self, job_key: &JobKey) -> bool {
        self.shared.table.read().is_job_running(job_key)
    }

    /// Fire a scheduled job once, now.
    ///
    /// Returns `false` if the fire was skipped because the job is running.
    pub fn trigger_job(&self, job_key: &JobKey) -> EngineResult<bool> {
        self.ensure_open()?;
        let firing = self
            .shared
            .table
            .read()
            .manual_firing(job_key, self.shared.clock.now())
            .ok_or_else(|| EngineError::JobNotFound(job_key.clone()))?;
        let submitted = self.shared.workers.submit(firing);
        info!(job_key = %job_key, ?submitted, "Job triggered manually");
        Ok(submitted == Submission::Spawned)
    }

    /// Run a job detail once through the worker pool without scheduling it.
    ///
    /// A detail whose key is scheduled shares that job's running flag, so the
    /// run is skipped (`false`) while a scheduled execution is in flight.
    pub fn execute_once(&self, detail: JobDetail) -> EngineResult<bool> {
        self.ensure_open()?;
        let running = self
            .shared
            .table
            .read()
            .running_flag(&detail.key)
            .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));
        let job_key = detail.key.clone();
        let submitted = self.shared.workers.submit(Firing {
            job: detail,
            trigger_key: None,
            scheduled_fire_time: self.shared.clock.now(),
            misfired: false,
            running,
        });
        debug!(job_key = %job_key, ?submitted, "Executing job once");
        Ok(submitted == Submission::Spawned)
    }

    /// Keys of all scheduled jobs, sorted.
    pub fn job_keys(&self) -> Vec<JobKey> {
        self.shared.table.read().job_keys()
    }

    /// Live state of a job's triggers.
    pub fn triggers_of_job(&self, job_key: &JobKey) -> EngineResult<Vec<TriggerState>> {
        self.shared.table.read().trigger_states(job_key)
    }

    /// Get number of idle workers.
    pub fn available_workers(&self) -> usize {
        self.shared.workers.available_workers()
    }

    /// Get a metrics snapshot.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Recent fire events, oldest first.
    pub fn recent_events(&self) -> Vec<FireEvent> {
        self.shared.events.recent()
    }
}

impl Drop for SchedulerEngine {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
