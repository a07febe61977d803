//! Worker pool for job execution.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::job::JobContext;
use crate::metrics::{EngineMetrics, EventLog, FireEventKind};
use crate::table::Firing;

/// Outcome of submitting a fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Submission {
    Spawned,
    Skipped,
}

/// Semaphore-bounded pool executing fires on spawned tasks.
///
/// Submission never awaits: the permit is acquired inside the spawned task so
/// the dispatch loop keeps its cadence while workers are saturated.
pub(crate) struct WorkerPool {
    semaphore: Arc<Semaphore>,
    tracker: TaskTracker,
    metrics: Arc<EngineMetrics>,
    events: Arc<EventLog>,
    clock: Clock,
}

impl WorkerPool {
    pub(crate) fn new(
        max_workers: usize,
        metrics: Arc<EngineMetrics>,
        events: Arc<EventLog>,
        clock: Clock,
    ) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_workers.max(1))),
            tracker: TaskTracker::new(),
            metrics,
            events,
            clock,
        }
    }

    /// Get number of idle workers.
    pub(crate) fn available_workers(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Hand a fire to the pool.
    ///
    /// The job's `running` flag is claimed here; a fire for a job that is
    /// still running is skipped and recorded.
    pub(crate) fn submit(&self, firing: Firing) -> Submission {
        let job_key = firing.job.key.clone();
        let trigger_key = firing.trigger_key.clone();

        if firing.misfired {
            self.metrics.record_misfired();
            self.events.record(
                &job_key,
                trigger_key.as_ref(),
                FireEventKind::Misfired {
                    scheduled: firing.scheduled_fire_time,
                },
            );
            warn!(
                job_key = %job_key,
                scheduled = %firing.scheduled_fire_time,
                "Trigger misfired, firing now"
            );
        }

        if firing
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.metrics.record_skipped();
            self.events
                .record(&job_key, trigger_key.as_ref(), FireEventKind::Skipped);
            debug!(job_key = %job_key, "Job still running, fire skipped");
            return Submission::Skipped;
        }

        self.metrics.record_fired();
        let ctx = JobContext {
            fire_instance_id: Uuid::new_v4(),
            job_key: job_key.clone(),
            trigger_key: trigger_key.clone(),
            scheduled_fire_time: firing.scheduled_fire_time,
            fire_time: self.clock.now(),
            data: firing.job.data.clone(),
        };
        let handler = Arc::clone(&firing.job.handler);
        let running = firing.running;
        let semaphore = Arc::clone(&self.semaphore);
        let metrics = Arc::clone(&self.metrics);
        let events = Arc::clone(&self.events);

        self.tracker.spawn(async move {
            // The semaphore is never closed.
            let _permit = semaphore.acquire_owned().await.ok();
            metrics.record_started();
            debug!(job_key = %job_key, fire_instance_id = %ctx.fire_instance_id, "Executing job");

            let started = Instant::now();
            // Inner spawn isolates handler panics behind the JoinError.
            let result = tokio::spawn(async move { handler.execute(ctx).await }).await;
            running.store(false, Ordering::SeqCst);

            let kind = match result {
                Ok(Ok(())) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    debug!(job_key = %job_key, duration_ms, "Job completed");
                    FireEventKind::Completed { duration_ms }
                }
                Ok(Err(e)) => {
                    error!(job_key = %job_key, error = %e, "Job failed");
                    FireEventKind::Failed {
                        error: e.to_string(),
                    }
                }
                Err(join_error) => {
                    error!(job_key = %job_key, error = %join_error, "Job panicked");
                    FireEventKind::Failed {
                        error: join_error.to_string(),
                    }
                }
            };
            metrics.record_finished(matches!(kind, FireEventKind::Completed { .. }));
            events.record(&job_key, trigger_key.as_ref(), kind);
        });
        Submission::Spawned
    }

    /// Stop accepting work and optionally wait for in-flight executions.
    pub(crate) async fn close(&self, wait: bool) {
        self.tracker.close();
        if wait {
            self.tracker.wait().await;
        }
    }
}
