//! In-memory job record store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::record::{JobRecord, TriggerRecord};
use crate::search::SearchCriteria;
use crate::store::JobRecordStore;

#[derive(Default)]
struct Tables {
    jobs: HashMap<String, JobRecord>,
    /// Triggers in insertion order.
    triggers: Vec<TriggerRecord>,
}

/// In-memory job record store, used for tests and the `memory` backend.
pub struct MemoryJobRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryJobRecordStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for MemoryJobRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobRecordStore for MemoryJobRecordStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<JobRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.jobs.get(id).cloned())
    }

    async fn find_all_matching(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<JobRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(criteria.apply(tables.jobs.values().cloned()))
    }

    async fn find_triggers_by_job_id(&self, job_id: &str) -> Result<Vec<TriggerRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .triggers
            .iter()
            .filter(|t| t.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn save_job(&self, job: &JobRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .jobs
            .values()
            .any(|j| j.id != job.id && j.name == job.name && j.group == job.group);
        if duplicate {
            return Err(StoreError::Duplicate {
                name: job.name.clone(),
                group: job.group.clone(),
            });
        }
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn save_trigger(&self, trigger: &TriggerRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.jobs.contains_key(&trigger.job_id) {
            return Err(StoreError::NotFound(format!("job {}", trigger.job_id)));
        }
        let duplicate = tables
            .triggers
            .iter()
            .any(|t| t.id != trigger.id && t.name == trigger.name && t.group == trigger.group);
        if duplicate {
            return Err(StoreError::DuplicateTrigger {
                name: trigger.name.clone(),
                group: trigger.group.clone(),
            });
        }
        match tables.triggers.iter_mut().find(|t| t.id == trigger.id) {
            Some(existing) => *existing = trigger.clone(),
            None => tables.triggers.push(trigger.clone()),
        }
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let existed = tables.jobs.remove(id).is_some();
        tables.triggers.retain(|t| t.job_id != id);
        Ok(existed)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
