//! Tests for the scheduler engine.

use super::*;
use crate::job::{JobContext, JobError, JobHandler};
use crate::metrics::FireEventKind;
use async_trait::async_trait;
use chrono::TimeDelta;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

/// Counts executions, optionally sleeping or failing.
#[derive(Default)]
struct CountingJob {
    executions: AtomicUsize,
    delay: Duration,
    fail: bool,
}

impl CountingJob {
    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Default::default()
        })
    }

    fn count(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobHandler for CountingJob {
    async fn execute(&self, _ctx: JobContext) -> Result<(), JobError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(JobError::new("boom"));
        }
        Ok(())
    }
}

struct PanickingJob;

#[async_trait]
impl JobHandler for PanickingJob {
    async fn execute(&self, _ctx: JobContext) -> Result<(), JobError> {
        panic!("handler panicked");
    }
}

fn job_key(name: &str) -> JobKey {
    JobKey::new(name, "tests")
}

fn detail(name: &str, handler: Arc<dyn JobHandler>) -> JobDetail {
    JobDetail::new(job_key(name), "tests.counting", handler)
}

fn hourly(job: &str, trigger: &str) -> Trigger {
    Trigger::cron(TriggerKey::new(trigger, "tests"), job_key(job), "0 0 * * * ?").unwrap()
}

fn every(job: &str, trigger: &str, ms: u64, repeat: Option<u32>) -> Trigger {
    Trigger::simple(
        TriggerKey::new(trigger, "tests"),
        job_key(job),
        Duration::from_millis(ms),
        repeat,
    )
    .unwrap()
}

fn engine() -> SchedulerEngine {
    SchedulerEngine::new(EngineConfig::default())
}

/// Engine whose fire times follow the (paused) tokio clock.
fn paused_engine(clock: Clock) -> SchedulerEngine {
    SchedulerEngine::with_clock(EngineConfig::default(), clock)
}

#[tokio::test]
async fn test_duplicate_schedule_leaves_triggers_untouched() {
    let engine = engine();
    let handler = Arc::new(CountingJob::default());
    engine
        .schedule_job(detail("report", handler.clone()), vec![hourly("report", "h1")], false)
        .unwrap();
    let before = engine.triggers_of_job(&job_key("report")).unwrap();

    let result = engine.schedule_job(
        detail("report", handler),
        vec![hourly("report", "h2")],
        false,
    );
    assert!(matches!(result, Err(EngineError::AlreadyScheduled(_))));
    assert_eq!(engine.triggers_of_job(&job_key("report")).unwrap(), before);
    assert!(!engine.is_scheduled_trigger(&TriggerKey::new("h2", "tests")));
}

#[tokio::test]
async fn test_replace_existing_swaps_triggers() {
    let engine = engine();
    let handler = Arc::new(CountingJob::default());
    engine
        .schedule_job(detail("report", handler.clone()), vec![hourly("report", "h1")], false)
        .unwrap();
    engine
        .schedule_job(detail("report", handler), vec![hourly("report", "h2")], true)
        .unwrap();

    assert!(!engine.is_scheduled_trigger(&TriggerKey::new("h1", "tests")));
    assert!(engine.is_scheduled_trigger(&TriggerKey::new("h2", "tests")));
}

#[tokio::test]
async fn test_unschedule_true_then_false() {
    let engine = engine();
    engine
        .schedule_job(
            detail("report", Arc::new(CountingJob::default())),
            vec![hourly("report", "h1")],
            false,
        )
        .unwrap();

    assert!(engine.unschedule_job(&job_key("report")).unwrap());
    assert!(!engine.is_scheduled_job(&job_key("report")));
    assert!(!engine.unschedule_job(&job_key("report")).unwrap());
    assert!(!engine.is_scheduled_job(&job_key("report")));
    assert!(!engine.is_scheduled_trigger(&TriggerKey::new("h1", "tests")));
}

#[tokio::test]
async fn test_pause_resume_keeps_fire_times() {
    let engine = engine();
    engine
        .schedule_job(
            detail("report", Arc::new(CountingJob::default())),
            vec![hourly("report", "h1"), every("report", "fast", 60_000, None)],
            false,
        )
        .unwrap();
    let key = job_key("report");
    let before = engine.triggers_of_job(&key).unwrap();

    engine.pause_job(&key).unwrap();
    assert!(engine.is_paused_job(&key));
    assert!(engine.is_paused_trigger(&TriggerKey::new("h1", "tests")));
    let paused = engine.triggers_of_job(&key).unwrap();
    assert_eq!(paused.len(), before.len());
    for (b, p) in before.iter().zip(&paused) {
        assert_eq!(b.key, p.key);
        assert_eq!(b.next_fire_time, p.next_fire_time);
        assert!(p.paused);
    }

    engine.resume_job(&key).unwrap();
    assert!(!engine.is_paused_job(&key));
    assert_eq!(engine.triggers_of_job(&key).unwrap(), before);
}

#[tokio::test]
async fn test_pause_unknown_job_is_not_found() {
    let engine = engine();
    let result = engine.pause_job(&job_key("missing"));
    assert!(matches!(result, Err(EngineError::JobNotFound(_))));
    let result = engine.resume_trigger(&TriggerKey::new("missing", "tests"));
    assert!(matches!(result, Err(ref e) if e.is_not_found()));
}

#[tokio::test]
async fn test_never_scheduled_job_status() {
    let engine = engine();
    assert!(!engine.is_scheduled_job(&job_key("ghost")));
    assert!(!engine.is_paused_job(&job_key("ghost")));
    assert!(!engine.is_scheduled_trigger(&TriggerKey::new("ghost", "tests")));
    assert!(!engine.is_paused_trigger(&TriggerKey::new("ghost", "tests")));
}

#[tokio::test(start_paused = true)]
async fn test_simple_trigger_fires_repeat_count_plus_one() {
    let engine = paused_engine(Clock::tokio());
    let handler = Arc::new(CountingJob::default());
    engine
        .schedule_job(
            detail("report", handler.clone()),
            vec![every("report", "fast", 40, Some(2)), hourly("report", "h1")],
            false,
        )
        .unwrap();
    engine.start().unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(handler.count(), 3);
    assert!(!engine.is_scheduled_trigger(&TriggerKey::new("fast", "tests")));
    assert!(engine.is_scheduled_job(&job_key("report")));
    assert!(engine.is_scheduled_trigger(&TriggerKey::new("h1", "tests")));
    assert_eq!(engine.metrics().retired, 1);
    engine.shutdown(true).await;
}

#[tokio::test(start_paused = true)]
async fn test_job_removed_after_last_trigger_retires() {
    let engine = paused_engine(Clock::tokio());
    let handler = Arc::new(CountingJob::default());
    engine
        .schedule_job(
            detail("once", handler.clone()),
            vec![every("once", "t1", 20, Some(0))],
            false,
        )
        .unwrap();
    engine.start().unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(handler.count(), 1);
    assert!(!engine.is_scheduled_job(&job_key("once")));
    engine.shutdown(true).await;
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_fire_is_skipped() {
    let engine = paused_engine(Clock::tokio());
    let handler = CountingJob::slow(Duration::from_millis(200));
    engine
        .schedule_job(detail("slow", handler.clone()), vec![hourly("slow", "h1")], false)
        .unwrap();

    assert!(engine.trigger_job(&job_key("slow")).unwrap());
    assert!(!engine.trigger_job(&job_key("slow")).unwrap());

    engine.shutdown(true).await;
    assert_eq!(handler.count(), 1);
    let metrics = engine.metrics();
    assert_eq!(metrics.fired, 1);
    assert_eq!(metrics.skipped, 1);
    assert!(
        engine
            .recent_events()
            .iter()
            .any(|e| e.kind == FireEventKind::Skipped)
    );
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_fires_skip_while_running() {
    let engine = paused_engine(Clock::tokio());
    let handler = CountingJob::slow(Duration::from_millis(300));
    engine
        .schedule_job(
            detail("slow", handler.clone()),
            vec![every("slow", "fast", 50, None)],
            false,
        )
        .unwrap();
    engine.start().unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(handler.count(), 1);
    assert!(engine.metrics().skipped >= 1);
    assert!(engine.is_job_running(&job_key("slow")));
    engine.shutdown(false).await;
}

#[tokio::test(start_paused = true)]
async fn test_misfire_fires_once_then_catches_up() {
    let clock = Clock::tokio();
    let engine = paused_engine(clock);
    let handler = Arc::new(CountingJob::default());
    let start = clock.now() - TimeDelta::minutes(10);
    let trigger = every("late", "minutely", 60_000, None)
        .with_window(Some(start), None)
        .unwrap();
    engine
        .schedule_job(detail("late", handler.clone()), vec![trigger], false)
        .unwrap();
    engine.start().unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(handler.count(), 1);
    assert_eq!(engine.metrics().misfired, 1);
    let states = engine.triggers_of_job(&job_key("late")).unwrap();
    let next = states[0].next_fire_time.unwrap();
    assert!(next > clock.now());
    assert!(next <= clock.now() + TimeDelta::minutes(1));
    assert_eq!(states[0].times_triggered, 1);
    assert!(
        engine
            .recent_events()
            .iter()
            .any(|e| matches!(e.kind, FireEventKind::Misfired { scheduled } if scheduled == start))
    );
    engine.shutdown(true).await;
}

#[tokio::test(start_paused = true)]
async fn test_trigger_never_fires_after_end_time() {
    let clock = Clock::tokio();
    let engine = paused_engine(clock);
    let handler = Arc::new(CountingJob::default());
    let end = clock.now() + TimeDelta::milliseconds(100);
    let trigger = every("bounded", "t1", 40, None)
        .with_window(None, Some(end))
        .unwrap();
    engine
        .schedule_job(detail("bounded", handler.clone()), vec![trigger], false)
        .unwrap();
    engine.start().unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;

    // Slots at 0, 40 and 80ms; 120ms is past the end.
    assert_eq!(handler.count(), 3);
    assert!(!engine.is_scheduled_job(&job_key("bounded")));

    let closed = every("closed", "t2", 40, None)
        .with_window(Some(end - TimeDelta::seconds(1)), Some(end))
        .unwrap();
    let result = engine.schedule_job(detail("closed", handler.clone()), vec![closed], false);
    assert!(matches!(result, Err(EngineError::InvalidSchedule(_))));
    engine.shutdown(true).await;
}

#[tokio::test(start_paused = true)]
async fn test_resumed_overdue_trigger_fires() {
    let engine = paused_engine(Clock::tokio());
    let handler = Arc::new(CountingJob::default());
    engine
        .schedule_job(
            detail("paused", handler.clone()),
            vec![every("paused", "t1", 60_000, None)],
            false,
        )
        .unwrap();
    engine.pause_job(&job_key("paused")).unwrap();
    engine.start().unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handler.count(), 0);

    engine.resume_job(&job_key("paused")).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handler.count(), 1);
    engine.shutdown(true).await;
}

#[tokio::test]
async fn test_handler_failure_is_recorded() {
    let engine = engine();
    let handler = Arc::new(CountingJob {
        fail: true,
        ..Default::default()
    });
    engine
        .schedule_job(detail("flaky", handler.clone()), vec![hourly("flaky", "h1")], false)
        .unwrap();

    engine.trigger_job(&job_key("flaky")).unwrap();
    engine.shutdown(true).await;

    assert_eq!(engine.metrics().failed, 1);
    assert!(
        engine
            .recent_events()
            .iter()
            .any(|e| e.kind == FireEventKind::Failed { error: "boom".into() })
    );
}

#[tokio::test(start_paused = true)]
async fn test_handler_panic_is_isolated() {
    let engine = paused_engine(Clock::tokio());
    engine
        .schedule_job(detail("panics", Arc::new(PanickingJob)), vec![hourly("panics", "h1")], false)
        .unwrap();
    let handler = Arc::new(CountingJob::default());
    engine
        .schedule_job(detail("healthy", handler.clone()), vec![hourly("healthy", "h2")], false)
        .unwrap();

    assert!(engine.trigger_job(&job_key("panics")).unwrap());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!engine.is_job_running(&job_key("panics")));

    assert!(engine.trigger_job(&job_key("healthy")).unwrap());
    engine.shutdown(true).await;

    assert_eq!(engine.metrics().failed, 1);
    assert_eq!(engine.metrics().completed, 1);
    assert_eq!(handler.count(), 1);
}

#[tokio::test]
async fn test_execute_once_runs_unscheduled_detail() {
    let engine = engine();
    let handler = Arc::new(CountingJob::default());
    assert!(engine.execute_once(detail("boot", handler.clone())).unwrap());
    engine.shutdown(true).await;

    assert_eq!(handler.count(), 1);
    assert!(!engine.is_scheduled_job(&job_key("boot")));
}

#[tokio::test(start_paused = true)]
async fn test_execute_once_skips_while_scheduled_run_in_flight() {
    let engine = paused_engine(Clock::tokio());
    let handler = CountingJob::slow(Duration::from_millis(200));
    engine
        .schedule_job(detail("slow", handler.clone()), vec![hourly("slow", "h1")], false)
        .unwrap();

    assert!(engine.trigger_job(&job_key("slow")).unwrap());
    assert!(!engine.execute_once(detail("slow", handler.clone())).unwrap());
    assert_eq!(engine.metrics().skipped, 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!engine.is_job_running(&job_key("slow")));
    assert!(engine.execute_once(detail("slow", handler.clone())).unwrap());
    assert!(!engine.trigger_job(&job_key("slow")).unwrap());

    engine.shutdown(true).await;
    assert_eq!(handler.count(), 2);
}

#[tokio::test]
async fn test_trigger_unknown_job_is_not_found() {
    let engine = engine();
    let result = engine.trigger_job(&job_key("missing"));
    assert!(matches!(result, Err(EngineError::JobNotFound(_))));
}

#[tokio::test]
async fn test_non_durable_job_needs_triggers() {
    let engine = engine();
    let result = engine.schedule_job(detail("empty", Arc::new(CountingJob::default())), vec![], false);
    assert!(matches!(result, Err(EngineError::NoTriggers(_))));

    engine
        .schedule_job(
            detail("empty", Arc::new(CountingJob::default())).with_durable(true),
            vec![],
            false,
        )
        .unwrap();
    assert!(engine.is_scheduled_job(&job_key("empty")));
    assert!(!engine.is_paused_job(&job_key("empty")));
}

#[tokio::test]
async fn test_trigger_owned_by_other_job_is_rejected() {
    let engine = engine();
    engine
        .schedule_job(
            detail("a", Arc::new(CountingJob::default())),
            vec![hourly("a", "shared")],
            false,
        )
        .unwrap();
    let result = engine.schedule_job(
        detail("b", Arc::new(CountingJob::default())),
        vec![hourly("b", "shared")],
        false,
    );
    assert!(matches!(result, Err(EngineError::TriggerAlreadyScheduled(_))));
    assert!(!engine.is_scheduled_job(&job_key("b")));
}

#[tokio::test]
async fn test_lifecycle() {
    let engine = engine();
    assert!(!engine.is_started());
    engine.start().unwrap();
    assert!(engine.is_started());
    assert!(matches!(engine.start(), Err(EngineError::AlreadyStarted)));

    engine.shutdown(true).await;
    engine.shutdown(true).await;
    assert!(engine.is_shutdown());
    assert!(matches!(engine.start(), Err(EngineError::ShutDown)));

    let result = engine.schedule_job(
        detail("late", Arc::new(CountingJob::default())),
        vec![hourly("late", "h1")],
        false,
    );
    assert!(matches!(result, Err(EngineError::ShutDown)));
    assert!(matches!(
        engine.unschedule_job(&job_key("late")),
        Err(EngineError::ShutDown)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_standby_does_not_fire() {
    let engine = paused_engine(Clock::tokio());
    let handler = Arc::new(CountingJob::default());
    engine
        .schedule_job(
            detail("idle", handler.clone()),
            vec![every("idle", "fast", 10, None)],
            false,
        )
        .unwrap();

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(handler.count(), 0);

    engine.start().unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(handler.count() >= 1);
    engine.shutdown(true).await;
}
