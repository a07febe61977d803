//! # JobHands Store
//!
//! Persisted representation of job and trigger definitions.
//!
//! The store is pure data access: it knows nothing about the live scheduler.
//! Records are reconciled with the engine by the control layer.

pub mod error;
pub mod memory;
pub mod record;
pub mod search;
pub mod sqlite;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryJobRecordStore;
pub use record::{JobDataMap, JobRecord, TriggerRecord, TriggerType};
pub use search::SearchCriteria;
pub use sqlite::SqliteJobRecordStore;
pub use store::JobRecordStore;
