//! Job and trigger keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default group used when none is given.
pub const DEFAULT_GROUP: &str = "DEFAULT";

/// Identifies a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    /// Job name, unique within the group.
    pub name: String,
    /// Job group.
    pub group: String,
}

impl JobKey {
    /// Create a new job key.
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
        }
    }

    /// Create a job key in the default group.
    pub fn in_default_group(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_GROUP)
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// Identifies a scheduled trigger.
///
/// Trigger keys are unique across the whole engine, not only within a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerKey {
    /// Trigger name, unique within the group.
    pub name: String,
    /// Trigger group.
    pub group: String,
}

impl TriggerKey {
    /// Create a new trigger key.
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
        }
    }

    /// Create a trigger key in the default group.
    pub fn in_default_group(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_GROUP)
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}
