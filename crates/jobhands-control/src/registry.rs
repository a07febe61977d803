//! Job handler registry.
//!
//! Maps a job class reference (the `job_class` string on a record) to the
//! handler that executes it, together with the job's declared defaults. The
//! registry is populated explicitly at startup.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use jobhands_engine::{DEFAULT_GROUP, JobDataMap, JobHandler};
use serde_json::Value;

use crate::error::{ControlError, ControlResult};
use crate::info::TriggerInfo;

/// A registered handler and its declared defaults.
#[derive(Clone)]
pub struct JobRegistration {
    /// Reference the handler is registered under.
    pub reference: String,
    /// Executable unit.
    pub handler: Arc<dyn JobHandler>,
    /// Declared job name.
    pub name: String,
    /// Declared job group.
    pub group: String,
    pub description: Option<String>,
    /// Default job data.
    pub data: JobDataMap,
    /// Triggers used when a job has none stored.
    pub default_triggers: Vec<TriggerInfo>,
}

impl JobRegistration {
    /// Create a registration named after its reference, in the default group.
    pub fn new(reference: impl Into<String>, handler: Arc<dyn JobHandler>) -> Self {
        let reference = reference.into();
        Self {
            name: reference.clone(),
            reference,
            handler,
            group: DEFAULT_GROUP.to_string(),
            description: None,
            data: JobDataMap::new(),
            default_triggers: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Add a default trigger.
    pub fn with_trigger(mut self, trigger: TriggerInfo) -> Self {
        self.default_triggers.push(trigger);
        self
    }
}

impl fmt::Debug for JobRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRegistration")
            .field("reference", &self.reference)
            .field("name", &self.name)
            .field("group", &self.group)
            .field("default_triggers", &self.default_triggers)
            .finish_non_exhaustive()
    }
}

/// Registry of job handlers keyed by reference.
pub struct JobRegistry {
    items: DashMap<String, Arc<JobRegistration>>,
}

impl JobRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Register a handler.
    ///
    /// Returns an error if the reference is already registered.
    pub fn register(&self, registration: JobRegistration) -> ControlResult<()> {
        let reference = registration.reference.clone();
        if self.items.contains_key(&reference) {
            return Err(ControlError::Registry(format!(
                "job class already registered: {}",
                reference
            )));
        }
        self.items.insert(reference, Arc::new(registration));
        Ok(())
    }

    /// Unregister a handler by reference.
    pub fn unregister(&self, reference: &str) -> ControlResult<()> {
        self.items
            .remove(reference)
            .ok_or_else(|| ControlError::Registry(format!("job class not registered: {}", reference)))?;
        Ok(())
    }

    /// Get a registration by reference.
    pub fn get(&self, reference: &str) -> Option<Arc<JobRegistration>> {
        self.items.get(reference).map(|item| item.clone())
    }

    /// Resolve a reference or fail with [`ControlError::Resolution`].
    pub fn resolve(&self, reference: &str) -> ControlResult<Arc<JobRegistration>> {
        self.get(reference)
            .ok_or_else(|| ControlError::Resolution(reference.to_string()))
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.items.contains_key(reference)
    }

    /// List all registered references, sorted.
    pub fn list_references(&self) -> Vec<String> {
        let mut references: Vec<_> = self.items.iter().map(|item| item.key().clone()).collect();
        references.sort();
        references
    }

    /// All registrations, sorted by reference.
    pub fn registrations(&self) -> Vec<Arc<JobRegistration>> {
        let mut items: Vec<_> = self.items.iter().map(|entry| entry.value().clone()).collect();
        items.sort_by(|a, b| a.reference.cmp(&b.reference));
        items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jobhands_engine::{JobContext, JobError};

    struct Noop;

    #[async_trait]
    impl JobHandler for Noop {
        async fn execute(&self, _ctx: JobContext) -> Result<(), JobError> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = JobRegistry::new();
        registry
            .register(
                JobRegistration::new("billing.report", Arc::new(Noop))
                    .with_name("report")
                    .with_group("billing"),
            )
            .unwrap();

        let registration = registry.resolve("billing.report").unwrap();
        assert_eq!(registration.name, "report");
        assert_eq!(registration.group, "billing");
        assert!(matches!(
            registry.resolve("unknown"),
            Err(ControlError::Resolution(_))
        ));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = JobRegistry::new();
        registry
            .register(JobRegistration::new("a", Arc::new(Noop)))
            .unwrap();
        let result = registry.register(JobRegistration::new("a", Arc::new(Noop)));
        assert!(matches!(result, Err(ControlError::Registry(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_defaults_and_listing() {
        let registry = JobRegistry::new();
        registry
            .register(JobRegistration::new("b", Arc::new(Noop)))
            .unwrap();
        registry
            .register(JobRegistration::new("a", Arc::new(Noop)))
            .unwrap();

        assert_eq!(registry.list_references(), vec!["a", "b"]);
        let a = registry.get("a").unwrap();
        assert_eq!(a.name, "a");
        assert_eq!(a.group, DEFAULT_GROUP);

        registry.unregister("a").unwrap();
        assert!(!registry.contains("a"));
        assert!(registry.unregister("a").is_err());
    }
}
