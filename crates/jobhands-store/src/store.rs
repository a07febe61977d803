//! Job record store trait.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::{JobRecord, TriggerRecord};
use crate::search::SearchCriteria;

/// Job record store trait for persistence.
#[async_trait]
pub trait JobRecordStore: Send + Sync {
    /// Load a job record by ID.
    async fn find_by_id(&self, id: &str) -> Result<Option<JobRecord>, StoreError>;

    /// Load all job records matching the criteria.
    async fn find_all_matching(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<JobRecord>, StoreError>;

    /// Load all triggers owned by a job record.
    async fn find_triggers_by_job_id(&self, job_id: &str) -> Result<Vec<TriggerRecord>, StoreError>;

    /// Load the first job record referencing a job class.
    async fn find_by_job_class(&self, job_class: &str) -> Result<Option<JobRecord>, StoreError> {
        let criteria = SearchCriteria::all().with_job_class(job_class);
        Ok(self.find_all_matching(&criteria).await?.into_iter().next())
    }

    /// Insert or update a job record.
    ///
    /// Fails with [`StoreError::Duplicate`] when another record already uses
    /// the same (name, group) pair.
    async fn save_job(&self, job: &JobRecord) -> Result<(), StoreError>;

    /// Insert or update a trigger record.
    ///
    /// Fails with [`StoreError::NotFound`] when the owning job does not exist.
    async fn save_trigger(&self, trigger: &TriggerRecord) -> Result<(), StoreError>;

    /// Delete a job record and its triggers. Returns whether it existed.
    async fn delete_job(&self, id: &str) -> Result<bool, StoreError>;
}
