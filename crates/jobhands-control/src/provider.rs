//! Job info provider.
//!
//! Builds [`JobInfo`] from persisted records or registration defaults and maps
//! it onto engine-native job details and triggers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobhands_engine::{EngineError, JobDetail, Trigger};
use jobhands_store::{JobRecord, JobRecordStore, TriggerType};
use tracing::debug;

use crate::error::{ControlError, ControlResult};
use crate::info::{JobInfo, TriggerInfo};
use crate::registry::{JobRegistration, JobRegistry};

/// Source of runtime job descriptions.
#[async_trait]
pub trait JobInfoProvider: Send + Sync {
    /// Describe the job registered under `reference`.
    ///
    /// Uses the stored record for that job class when one exists, otherwise
    /// the registration's declared defaults.
    async fn get_job(&self, reference: &str) -> ControlResult<JobInfo>;

    /// Describe the job behind a specific stored record.
    async fn get_job_for_record(&self, record: &JobRecord) -> ControlResult<JobInfo>;

    /// Map a job description to an engine job detail with its handler attached.
    fn convert_to_job_descriptor(&self, info: &JobInfo) -> ControlResult<JobDetail>;

    /// Map a trigger description to a validated engine trigger for `job`.
    fn convert_to_trigger(&self, trigger: &TriggerInfo, job: &JobInfo) -> ControlResult<Trigger>;
}

/// [`JobInfoProvider`] backed by a record store and the handler registry.
pub struct StoreJobInfoProvider {
    store: Arc<dyn JobRecordStore>,
    registry: Arc<JobRegistry>,
}

impl StoreJobInfoProvider {
    pub fn new(store: Arc<dyn JobRecordStore>, registry: Arc<JobRegistry>) -> Self {
        Self { store, registry }
    }

    fn from_registration(registration: &JobRegistration) -> JobInfo {
        JobInfo {
            name: registration.name.clone(),
            group: registration.group.clone(),
            job_class: registration.reference.clone(),
            description: registration.description.clone(),
            data: registration.data.clone(),
            triggers: registration.default_triggers.clone(),
        }
    }

    async fn from_record(
        &self,
        record: &JobRecord,
        registration: &JobRegistration,
    ) -> ControlResult<JobInfo> {
        let stored = self.store.find_triggers_by_job_id(&record.id).await?;
        let triggers = if stored.is_empty() {
            debug!(job_id = %record.id, "No stored triggers, using declared defaults");
            registration.default_triggers.clone()
        } else {
            stored.iter().map(TriggerInfo::from_record).collect()
        };
        Ok(JobInfo::from_record(record, triggers))
    }
}

fn invalid(error: EngineError) -> ControlError {
    match error {
        EngineError::InvalidSchedule(message) => ControlError::InvalidSchedule(message),
        other => ControlError::InvalidSchedule(other.to_string()),
    }
}

#[async_trait]
impl JobInfoProvider for StoreJobInfoProvider {
    async fn get_job(&self, reference: &str) -> ControlResult<JobInfo> {
        let registration = self.registry.resolve(reference)?;
        match self.store.find_by_job_class(reference).await? {
            Some(record) => self.from_record(&record, &registration).await,
            None => Ok(Self::from_registration(&registration)),
        }
    }

    async fn get_job_for_record(&self, record: &JobRecord) -> ControlResult<JobInfo> {
        let registration = self.registry.resolve(&record.job_class)?;
        self.from_record(record, &registration).await
    }

    fn convert_to_job_descriptor(&self, info: &JobInfo) -> ControlResult<JobDetail> {
        let registration = self.registry.resolve(&info.job_class)?;
        let mut detail = JobDetail::new(
            info.job_key(),
            info.job_class.clone(),
            Arc::clone(&registration.handler),
        )
        .with_data(info.data.clone());
        if let Some(description) = &info.description {
            detail = detail.with_description(description.clone());
        }
        Ok(detail)
    }

    fn convert_to_trigger(&self, trigger: &TriggerInfo, job: &JobInfo) -> ControlResult<Trigger> {
        let key = trigger.trigger_key();
        let base = match trigger.kind {
            TriggerType::Cron => {
                let expression = trigger.cron_expression.as_deref().ok_or_else(|| {
                    ControlError::InvalidSchedule(format!("trigger {} has no cron expression", key))
                })?;
                Trigger::cron(key, job.job_key(), expression).map_err(invalid)?
            }
            TriggerType::Simple => {
                let interval = trigger.repeat_interval_ms.ok_or_else(|| {
                    ControlError::InvalidSchedule(format!("trigger {} has no repeat interval", key))
                })?;
                Trigger::simple(
                    key,
                    job.job_key(),
                    Duration::from_millis(interval),
                    trigger.repeat_count,
                )
                .map_err(invalid)?
            }
            TriggerType::OnStartup | TriggerType::OnShutdown => {
                return Err(ControlError::InvalidSchedule(format!(
                    "trigger {} of type {} is not schedulable",
                    key, trigger.kind
                )));
            }
        };
        Ok(base
            .with_window(trigger.start_time, trigger.end_time)
            .map_err(invalid)?
            .with_priority(trigger.priority))
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
