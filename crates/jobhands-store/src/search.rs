//! Search criteria for listing job records.

use serde::{Deserialize, Serialize};

use crate::record::JobRecord;

/// Filters applied by [`JobRecordStore::find_all_matching`](crate::JobRecordStore::find_all_matching).
///
/// Results are ordered by (group, name) before `offset`/`limit` are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Case-insensitive substring matched against name, group and description.
    #[serde(default)]
    pub q: Option<String>,
    /// Exact group match.
    #[serde(default)]
    pub group: Option<String>,
    /// Exact job class match.
    #[serde(default)]
    pub job_class: Option<String>,
    /// Number of records to skip.
    #[serde(default)]
    pub offset: Option<usize>,
    /// Maximum number of records to return.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchCriteria {
    /// Criteria matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Set the free-text query.
    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    /// Restrict to a group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Restrict to a job class.
    pub fn with_job_class(mut self, job_class: impl Into<String>) -> Self {
        self.job_class = Some(job_class.into());
        self
    }

    /// Set paging.
    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    /// Check whether a record passes the filters (paging excluded).
    pub fn matches(&self, record: &JobRecord) -> bool {
        if let Some(group) = &self.group {
            if &record.group != group {
                return false;
            }
        }
        if let Some(job_class) = &self.job_class {
            if &record.job_class != job_class {
                return false;
            }
        }
        if let Some(q) = &self.q {
            let q = q.to_lowercase();
            let in_description = record
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(&q));
            if !record.name.to_lowercase().contains(&q)
                && !record.group.to_lowercase().contains(&q)
                && !in_description
            {
                return false;
            }
        }
        true
    }

    /// Filter, order and page a set of records.
    pub fn apply(&self, records: impl IntoIterator<Item = JobRecord>) -> Vec<JobRecord> {
        let mut matched: Vec<JobRecord> = records.into_iter().filter(|r| self.matches(r)).collect();
        matched.sort_by(|a, b| (&a.group, &a.name).cmp(&(&b.group, &b.name)));
        matched
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}
