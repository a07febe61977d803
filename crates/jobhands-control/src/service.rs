//! Job control service.
//!
//! Reconciles persisted job records with the live scheduler engine. Records
//! are looked up by ID, resolved through the [`JobInfoProvider`] and handed to
//! the engine by (name, group).
//!
//! Engine failures never escape this service: they are logged as structured
//! `warn!` records carrying the job key, the operation and the error, and the
//! operation reports `false`.

use std::collections::HashSet;
use std::sync::Arc;

use jobhands_engine::{EngineError, JobKey, SchedulerEngine, TriggerKey};
use jobhands_store::{JobRecord, JobRecordStore, SearchCriteria, StoreError, TriggerType};
use tracing::{debug, info, warn};

use crate::error::{ControlError, ControlResult};
use crate::info::{JobInfo, TriggerInfo};
use crate::provider::{JobInfoProvider, StoreJobInfoProvider};
use crate::registry::JobRegistry;
use crate::status::ScheduleStatus;
use crate::view::{JobView, TriggerView};

/// Control surface over the record store and the scheduler engine.
pub struct JobControlService {
    store: Arc<dyn JobRecordStore>,
    registry: Arc<JobRegistry>,
    provider: Arc<dyn JobInfoProvider>,
    engine: Arc<SchedulerEngine>,
}

impl JobControlService {
    /// Create a service using the store-backed provider.
    pub fn new(
        store: Arc<dyn JobRecordStore>,
        registry: Arc<JobRegistry>,
        engine: Arc<SchedulerEngine>,
    ) -> Self {
        let provider = Arc::new(StoreJobInfoProvider::new(
            Arc::clone(&store),
            Arc::clone(&registry),
        ));
        Self {
            store,
            registry,
            provider,
            engine,
        }
    }

    /// Replace the job info provider.
    pub fn with_provider(mut self, provider: Arc<dyn JobInfoProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Get the scheduler engine.
    pub fn engine(&self) -> &Arc<SchedulerEngine> {
        &self.engine
    }

    /// Get the handler registry.
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    async fn load(&self, id: &str) -> ControlResult<JobRecord> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ControlError::NotFound(id.to_string()))
    }

    fn engine_failed(&self, job_key: &JobKey, operation: &'static str, error: EngineError) -> bool {
        warn!(job_key = %job_key, operation, error = %error, "Scheduler operation failed");
        false
    }

    /// Submit a stored job to the engine.
    ///
    /// Returns `Ok(false)` if the engine rejects it (for example because it is
    /// already scheduled).
    ///
    /// # Errors
    ///
    /// - [`ControlError::NotFound`] if no record has this ID
    /// - [`ControlError::Resolution`] if the job class is not registered
    /// - [`ControlError::InvalidSchedule`] if a trigger is malformed
    pub async fn schedule(&self, id: &str) -> ControlResult<bool> {
        self.submit(id, false, "schedule").await
    }

    /// Like [`schedule`](Self::schedule), replacing a job already scheduled.
    pub async fn reschedule(&self, id: &str) -> ControlResult<bool> {
        self.submit(id, true, "reschedule").await
    }

    async fn submit(&self, id: &str, replace: bool, operation: &'static str) -> ControlResult<bool> {
        let record = self.load(id).await?;
        let info = self.provider.get_job_for_record(&record).await?;
        let detail = self.provider.convert_to_job_descriptor(&info)?;
        let triggers = info
            .schedulable_triggers()
            .map(|trigger| self.provider.convert_to_trigger(trigger, &info))
            .collect::<ControlResult<Vec<_>>>()?;

        let job_key = info.job_key();
        match self.engine.schedule_job(detail, triggers, replace) {
            Ok(()) => Ok(true),
            Err(EngineError::InvalidSchedule(message)) => Err(ControlError::InvalidSchedule(message)),
            Err(e) => Ok(self.engine_failed(&job_key, operation, e)),
        }
    }

    /// Remove a stored job from the engine. Returns `false` if it was not scheduled.
    pub async fn unschedule(&self, id: &str) -> ControlResult<bool> {
        let record = self.load(id).await?;
        let job_key = JobKey::new(&record.name, &record.group);
        match self.engine.unschedule_job(&job_key) {
            Ok(removed) => Ok(removed),
            Err(e) => Ok(self.engine_failed(&job_key, "unschedule", e)),
        }
    }

    /// Pause every trigger of a stored job.
    pub async fn pause(&self, id: &str) -> ControlResult<bool> {
        let record = self.load(id).await?;
        let job_key = JobKey::new(&record.name, &record.group);
        match self.engine.pause_job(&job_key) {
            Ok(()) => Ok(true),
            Err(e) => Ok(self.engine_failed(&job_key, "pause", e)),
        }
    }

    /// Resume every trigger of a stored job.
    pub async fn resume(&self, id: &str) -> ControlResult<bool> {
        let record = self.load(id).await?;
        let job_key = JobKey::new(&record.name, &record.group);
        match self.engine.resume_job(&job_key) {
            Ok(()) => Ok(true),
            Err(e) => Ok(self.engine_failed(&job_key, "resume", e)),
        }
    }

    /// Fire a scheduled job once, now. `false` if skipped or not scheduled.
    pub async fn fire_now(&self, id: &str) -> ControlResult<bool> {
        let record = self.load(id).await?;
        let job_key = JobKey::new(&record.name, &record.group);
        match self.engine.trigger_job(&job_key) {
            Ok(fired) => Ok(fired),
            Err(e) => Ok(self.engine_failed(&job_key, "fire", e)),
        }
    }

    /// Live status of a job.
    pub fn status_of(&self, name: &str, group: &str) -> ScheduleStatus {
        let job_key = JobKey::new(name, group);
        ScheduleStatus::from_flags(
            self.engine.is_scheduled_job(&job_key),
            self.engine.is_paused_job(&job_key),
        )
    }

    /// Live status of a trigger.
    pub fn trigger_status_of(&self, name: &str, group: &str) -> ScheduleStatus {
        let trigger_key = TriggerKey::new(name, group);
        ScheduleStatus::from_flags(
            self.engine.is_scheduled_trigger(&trigger_key),
            self.engine.is_paused_trigger(&trigger_key),
        )
    }

    fn job_view(&self, job: JobRecord) -> JobView {
        let status = self.status_of(&job.name, &job.group);
        JobView { job, status }
    }

    /// Stored jobs matching `criteria`, with live status.
    pub async fn list_jobs(&self, criteria: &SearchCriteria) -> ControlResult<Vec<JobView>> {
        let records = self.store.find_all_matching(criteria).await?;
        Ok(records.into_iter().map(|job| self.job_view(job)).collect())
    }

    /// A stored job with live status.
    pub async fn get_job(&self, id: &str) -> ControlResult<JobView> {
        let record = self.load(id).await?;
        Ok(self.job_view(record))
    }

    /// Stored triggers of a job, with live status and fire times.
    pub async fn list_triggers(&self, job_id: &str) -> ControlResult<Vec<TriggerView>> {
        let record = self.load(job_id).await?;
        let live = self
            .engine
            .triggers_of_job(&JobKey::new(&record.name, &record.group))
            .unwrap_or_default();
        let triggers = self.store.find_triggers_by_job_id(job_id).await?;

        Ok(triggers
            .into_iter()
            .map(|trigger| {
                let key = TriggerKey::new(&trigger.name, &trigger.group);
                let state = live.iter().find(|state| state.key == key);
                TriggerView {
                    status: self.trigger_status_of(&trigger.name, &trigger.group),
                    next_fire_time: state.and_then(|s| s.next_fire_time),
                    previous_fire_time: state.and_then(|s| s.previous_fire_time),
                    times_triggered: state.map_or(0, |s| s.times_triggered),
                    trigger,
                }
            })
            .collect())
    }

    /// Store a new job record and its triggers.
    ///
    /// The job class must be registered, every schedulable trigger must be
    /// valid and trigger keys must be unique. Nothing is stored otherwise.
    pub async fn create_job(
        &self,
        job: JobRecord,
        triggers: Vec<TriggerInfo>,
    ) -> ControlResult<JobRecord> {
        self.registry.resolve(&job.job_class)?;
        let info = JobInfo::from_record(&job, triggers);
        for trigger in info.schedulable_triggers() {
            self.provider.convert_to_trigger(trigger, &info)?;
        }
        let mut seen = HashSet::new();
        for trigger in &info.triggers {
            if !seen.insert((trigger.name.as_str(), trigger.group.as_str())) {
                return Err(StoreError::DuplicateTrigger {
                    name: trigger.name.clone(),
                    group: trigger.group.clone(),
                }
                .into());
            }
        }

        self.store_with_triggers(&job, &info.triggers).await?;
        info!(job_id = %job.id, job_key = %info.job_key(), "Job record created");
        Ok(job)
    }

    /// Save a job record and its triggers. A failed trigger save removes the
    /// job record again so no partial job is left behind.
    async fn store_with_triggers(
        &self,
        job: &JobRecord,
        triggers: &[TriggerInfo],
    ) -> ControlResult<()> {
        self.store.save_job(job).await?;
        for trigger in triggers {
            if let Err(e) = self.store.save_trigger(&trigger.to_record(&job.id)).await {
                warn!(
                    job_id = %job.id,
                    trigger = %trigger.name,
                    error = %e,
                    "Trigger not stored, removing job record"
                );
                if let Err(cleanup) = self.store.delete_job(&job.id).await {
                    warn!(job_id = %job.id, error = %cleanup, "Partial job record not removed");
                }
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Unschedule and delete a stored job.
    pub async fn delete_job(&self, id: &str) -> ControlResult<()> {
        self.unschedule(id).await?;
        if !self.store.delete_job(id).await? {
            return Err(ControlError::NotFound(id.to_string()));
        }
        info!(job_id = %id, "Job record deleted");
        Ok(())
    }

    /// Store a record, with default triggers, for every registered handler
    /// that has none yet. Returns the number of records created.
    pub async fn sync_registered_jobs(&self) -> ControlResult<usize> {
        let mut created = 0;
        for registration in self.registry.registrations() {
            if self
                .store
                .find_by_job_class(&registration.reference)
                .await?
                .is_some()
            {
                continue;
            }

            let mut record = JobRecord::new(
                &registration.name,
                &registration.group,
                &registration.reference,
            );
            record.description = registration.description.clone();
            record.data = registration.data.clone();

            match self
                .store_with_triggers(&record, &registration.default_triggers)
                .await
            {
                Ok(()) => {}
                Err(ControlError::Store(
                    StoreError::Duplicate { name, group }
                    | StoreError::DuplicateTrigger { name, group },
                )) => {
                    warn!(
                        job_class = %registration.reference,
                        name = %name,
                        group = %group,
                        "Registered job clashes with a stored record, not synced"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }
            debug!(job_class = %registration.reference, job_id = %record.id, "Registered job synced");
            created += 1;
        }
        if created > 0 {
            info!(created, "Synced registered jobs to the store");
        }
        Ok(created)
    }

    /// Schedule every stored job. Returns the number newly scheduled.
    ///
    /// Per-job failures are logged and do not stop the pass.
    pub async fn schedule_all(&self) -> ControlResult<usize> {
        let records = self.store.find_all_matching(&SearchCriteria::all()).await?;
        let mut scheduled = 0;
        for record in records {
            match self.schedule(&record.id).await {
                Ok(true) => scheduled += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(job_id = %record.id, operation = "schedule", error = %e, "Job not scheduled");
                }
            }
        }
        info!(scheduled, "Scheduled stored jobs");
        Ok(scheduled)
    }

    /// Run once every stored job with a trigger of the given lifecycle kind.
    /// Returns the number of jobs submitted.
    pub async fn run_lifecycle_jobs(&self, kind: TriggerType) -> ControlResult<usize> {
        let records = self.store.find_all_matching(&SearchCriteria::all()).await?;
        let mut submitted = 0;
        for record in records {
            let info = match self.provider.get_job_for_record(&record).await {
                Ok(info) => info,
                Err(e) => {
                    warn!(job_id = %record.id, operation = kind.as_str(), error = %e, "Lifecycle job skipped");
                    continue;
                }
            };
            if !info.has_trigger_kind(kind) {
                continue;
            }
            let detail = self.provider.convert_to_job_descriptor(&info)?;
            let job_key = detail.key.clone();
            match self.engine.execute_once(detail) {
                Ok(true) => submitted += 1,
                Ok(false) => {
                    debug!(job_key = %job_key, kind = %kind, "Lifecycle run skipped, job already running");
                }
                Err(e) => {
                    self.engine_failed(&job_key, kind.as_str(), e);
                }
            }
        }
        if submitted > 0 {
            info!(kind = %kind, submitted, "Lifecycle jobs submitted");
        }
        Ok(submitted)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
