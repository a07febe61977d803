//! SQLite job record store.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::error::StoreError;
use crate::record::{JobDataMap, JobRecord, TriggerRecord};
use crate::search::SearchCriteria;
use crate::store::JobRecordStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    job_group TEXT NOT NULL,
    job_class TEXT NOT NULL,
    data TEXT NOT NULL DEFAULT '{}',
    description TEXT,
    UNIQUE (name, job_group)
);

CREATE TABLE IF NOT EXISTS triggers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    trigger_group TEXT NOT NULL,
    job_id TEXT NOT NULL,
    trigger_type TEXT NOT NULL,
    cron_expression TEXT,
    repeat_interval_ms INTEGER,
    repeat_count INTEGER,
    start_time TEXT,
    end_time TEXT,
    priority INTEGER NOT NULL DEFAULT 5,
    seq INTEGER NOT NULL,
    UNIQUE (name, trigger_group),
    FOREIGN KEY (job_id) REFERENCES jobs(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_triggers_job ON triggers(job_id);
CREATE INDEX IF NOT EXISTS idx_jobs_class ON jobs(job_class);
"#;

/// Outcome of a trigger upsert, decided inside the write transaction.
enum TriggerSave {
    Saved,
    MissingJob,
    Duplicate,
}

type JobRow = (String, String, String, String, String, Option<String>);

type TriggerRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<String>,
    i32,
);

/// SQLite-backed job record store.
pub struct SqliteJobRecordStore {
    conn: Connection,
}

impl SqliteJobRecordStore {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    /// Open (or create) a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        debug!("Opening SQLite job store at {:?}", path);
        let conn = Connection::open(path).await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    fn job_from_row(row: JobRow) -> Result<JobRecord, StoreError> {
        let (id, name, group, job_class, data, description) = row;
        let data: JobDataMap = serde_json::from_str(&data)?;
        Ok(JobRecord {
            id,
            name,
            group,
            job_class,
            data,
            description,
        })
    }

    fn trigger_from_row(row: TriggerRow) -> Result<TriggerRecord, StoreError> {
        let (
            id,
            name,
            group,
            job_id,
            trigger_type,
            cron_expression,
            repeat_interval_ms,
            repeat_count,
            start_time,
            end_time,
            priority,
        ) = row;
        let trigger_type = trigger_type.parse().map_err(StoreError::Database)?;
        Ok(TriggerRecord {
            id,
            name,
            group,
            job_id,
            trigger_type,
            cron_expression,
            repeat_interval_ms: repeat_interval_ms
                .map(|v| {
                    u64::try_from(v).map_err(|_| {
                        StoreError::Database(format!("invalid repeat_interval_ms {} for trigger", v))
                    })
                })
                .transpose()?,
            repeat_count: repeat_count
                .map(|v| {
                    u32::try_from(v).map_err(|_| {
                        StoreError::Database(format!("invalid repeat_count {} for trigger", v))
                    })
                })
                .transpose()?,
            start_time: parse_time(start_time)?,
            end_time: parse_time(end_time)?,
            priority,
        })
    }
}

fn parse_time(value: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| StoreError::Database(format!("invalid timestamp '{}': {}", s, e)))
        })
        .transpose()
}

#[async_trait]
impl JobRecordStore for SqliteJobRecordStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<JobRecord>, StoreError> {
        let id = id.to_string();
        let row: Option<JobRow> = self
            .conn
            .call(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT id, name, job_group, job_class, data, description
                         FROM jobs WHERE id = ?1",
                        [&id],
                        |row| {
                            Ok((
                                row.get(0)?,
                                row.get(1)?,
                                row.get(2)?,
                                row.get(3)?,
                                row.get(4)?,
                                row.get(5)?,
                            ))
                        },
                    )
                    .optional()?;
                Ok(row)
            })
            .await?;
        row.map(Self::job_from_row).transpose()
    }

    async fn find_all_matching(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<JobRecord>, StoreError> {
        let rows: Vec<JobRow> = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, job_group, job_class, data, description FROM jobs",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        let records = rows
            .into_iter()
            .map(Self::job_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(criteria.apply(records))
    }

    async fn find_triggers_by_job_id(&self, job_id: &str) -> Result<Vec<TriggerRecord>, StoreError> {
        let job_id = job_id.to_string();
        let rows: Vec<TriggerRow> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, trigger_group, job_id, trigger_type, cron_expression,
                            repeat_interval_ms, repeat_count, start_time, end_time, priority
                     FROM triggers WHERE job_id = ?1 ORDER BY seq",
                )?;
                let rows = stmt
                    .query_map([&job_id], |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                            row.get(7)?,
                            row.get(8)?,
                            row.get(9)?,
                            row.get(10)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        rows.into_iter().map(Self::trigger_from_row).collect()
    }

    async fn save_job(&self, job: &JobRecord) -> Result<(), StoreError> {
        let data = serde_json::to_string(&job.data)?;
        let job = job.clone();
        let (name, group) = (job.name.clone(), job.group.clone());

        let saved = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let clash: Option<String> = tx
                    .query_row(
                        "SELECT id FROM jobs WHERE name = ?1 AND job_group = ?2 AND id != ?3",
                        params![job.name, job.group, job.id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if clash.is_some() {
                    return Ok(false);
                }
                tx.execute(
                    "INSERT INTO jobs (id, name, job_group, job_class, data, description)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name,
                        job_group = excluded.job_group,
                        job_class = excluded.job_class,
                        data = excluded.data,
                        description = excluded.description",
                    params![job.id, job.name, job.group, job.job_class, data, job.description],
                )?;
                tx.commit()?;
                Ok(true)
            })
            .await?;

        if saved {
            Ok(())
        } else {
            Err(StoreError::Duplicate { name, group })
        }
    }

    async fn save_trigger(&self, trigger: &TriggerRecord) -> Result<(), StoreError> {
        let trigger = trigger.clone();
        let job_id = trigger.job_id.clone();
        let (name, group) = (trigger.name.clone(), trigger.group.clone());
        let repeat_interval_ms = trigger
            .repeat_interval_ms
            .map(|v| {
                i64::try_from(v)
                    .map_err(|_| StoreError::Database(format!("repeat_interval_ms {} out of range", v)))
            })
            .transpose()?;
        let repeat_count = trigger.repeat_count.map(i64::from);

        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let owner: Option<String> = tx
                    .query_row("SELECT id FROM jobs WHERE id = ?1", [&trigger.job_id], |row| {
                        row.get(0)
                    })
                    .optional()?;
                if owner.is_none() {
                    return Ok(TriggerSave::MissingJob);
                }
                let clash: Option<String> = tx
                    .query_row(
                        "SELECT id FROM triggers WHERE name = ?1 AND trigger_group = ?2 AND id != ?3",
                        params![trigger.name, trigger.group, trigger.id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if clash.is_some() {
                    return Ok(TriggerSave::Duplicate);
                }
                tx.execute(
                    "INSERT INTO triggers (id, name, trigger_group, job_id, trigger_type,
                                           cron_expression, repeat_interval_ms, repeat_count,
                                           start_time, end_time, priority, seq)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                             (SELECT COALESCE(MAX(seq), 0) + 1 FROM triggers))
                     ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name,
                        trigger_group = excluded.trigger_group,
                        job_id = excluded.job_id,
                        trigger_type = excluded.trigger_type,
                        cron_expression = excluded.cron_expression,
                        repeat_interval_ms = excluded.repeat_interval_ms,
                        repeat_count = excluded.repeat_count,
                        start_time = excluded.start_time,
                        end_time = excluded.end_time,
                        priority = excluded.priority",
                    params![
                        trigger.id,
                        trigger.name,
                        trigger.group,
                        trigger.job_id,
                        trigger.trigger_type.as_str(),
                        trigger.cron_expression,
                        repeat_interval_ms,
                        repeat_count,
                        trigger.start_time.map(|t| t.to_rfc3339()),
                        trigger.end_time.map(|t| t.to_rfc3339()),
                        trigger.priority,
                    ],
                )?;
                tx.commit()?;
                Ok(TriggerSave::Saved)
            })
            .await?;

        match outcome {
            TriggerSave::Saved => Ok(()),
            TriggerSave::MissingJob => Err(StoreError::NotFound(format!("job {}", job_id))),
            TriggerSave::Duplicate => Err(StoreError::DuplicateTrigger { name, group }),
        }
    }

    async fn delete_job(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM triggers WHERE job_id = ?1", [&id])?;
                let count = tx.execute("DELETE FROM jobs WHERE id = ?1", [&id])?;
                tx.commit()?;
                Ok(count > 0)
            })
            .await?;
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
