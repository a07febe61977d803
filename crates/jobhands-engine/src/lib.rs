//! # JobHands Engine
//!
//! In-process job scheduler.
//!
//! ## Features
//!
//! - Cron (Quartz-style `?` accepted) and fixed-interval triggers
//! - Single dispatch loop woken by table mutations, fire times and shutdown
//! - Semaphore-bounded worker pool, at most one execution per job
//! - Fire-now-then-catch-up misfire handling
//! - Counters and a bounded log of recent fire events
//!
//! ## Example
//!
//! ```rust,ignore
//! let engine = SchedulerEngine::new(EngineConfig::default());
//! let key = JobKey::new("report", "billing");
//! let detail = JobDetail::new(key.clone(), "billing.report", handler);
//! let hourly = Trigger::cron(TriggerKey::new("hourly", "billing"), key, "0 0 * * * ?")?;
//! engine.schedule_job(detail, vec![hourly], false)?;
//! engine.start()?;
//! ```

mod clock;
pub mod config;
mod dispatch;
pub mod engine;
pub mod error;
pub mod job;
pub mod key;
pub mod metrics;
mod table;
pub mod trigger;
mod worker;

pub use config::EngineConfig;
pub use engine::SchedulerEngine;
pub use error::{EngineError, EngineResult};
pub use job::{JobContext, JobDataMap, JobDetail, JobError, JobHandler};
pub use key::{DEFAULT_GROUP, JobKey, TriggerKey};
pub use metrics::{EngineMetrics, EventLog, FireEvent, FireEventKind, MetricsSnapshot};
pub use table::TriggerState;
pub use trigger::{DEFAULT_PRIORITY, Trigger, TriggerSchedule, normalize_cron};
