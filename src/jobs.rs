//! Built-in job handlers registered at boot.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobhands_control::{ControlError, JobRegistration, JobRegistry, TriggerInfo};
use jobhands_engine::{JobContext, JobError, JobHandler};
use serde_json::json;
use tracing::info;

/// Logs the `message` entry of its job data.
pub struct LogJob;

#[async_trait]
impl JobHandler for LogJob {
    async fn execute(&self, ctx: JobContext) -> Result<(), JobError> {
        let message = ctx
            .data
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("tick");
        info!(
            job_key = %ctx.job_key,
            fire_instance_id = %ctx.fire_instance_id,
            scheduled_fire_time = %ctx.scheduled_fire_time,
            "{}",
            message
        );
        Ok(())
    }
}

/// Sleeps for `duration_ms` milliseconds of job data.
pub struct SleepJob;

#[async_trait]
impl JobHandler for SleepJob {
    async fn execute(&self, ctx: JobContext) -> Result<(), JobError> {
        let millis = match ctx.data.get("duration_ms") {
            None => 1000,
            Some(value) => value
                .as_u64()
                .ok_or_else(|| JobError::new("duration_ms must be a non-negative integer"))?,
        };
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(())
    }
}

/// Register the built-in handlers.
///
/// `builtin.log` defaults to an hourly heartbeat.
pub fn register_builtin_jobs(registry: &JobRegistry) -> Result<(), ControlError> {
    registry.register(
        JobRegistration::new("builtin.log", Arc::new(LogJob))
            .with_name("log")
            .with_group("builtin")
            .with_description("Logs the configured message")
            .with_data("message", json!("heartbeat"))
            .with_trigger(TriggerInfo::cron("hourly", "builtin", "0 0 * * * ?")),
    )?;
    registry.register(
        JobRegistration::new("builtin.sleep", Arc::new(SleepJob))
            .with_name("sleep")
            .with_group("builtin")
            .with_description("Sleeps for duration_ms milliseconds"),
    )?;
    Ok(())
}
