//! Configuration validation.

use std::path::Path;

use crate::error::ConfigError;
use crate::loader::ConfigLoader;
use crate::schema::{Config, StoreBackend};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// First error as a [`ConfigError`], if any.
    pub fn into_error(self) -> Option<ConfigError> {
        self.errors.into_iter().next().map(|e| ConfigError::InvalidValue {
            field: e.path,
            message: e.message,
        })
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_scheduler(config, &mut result);
        Self::validate_store(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        let scheduler = &config.scheduler;
        if scheduler.max_workers == 0 {
            result.add_error(ValidationError::new(
                "scheduler.max_workers",
                "max_workers must be greater than 0",
            ));
        }

        if scheduler.max_workers > 1000 {
            result.add_warning(ValidationWarning::new(
                "scheduler.max_workers",
                "max_workers is very high (>1000)",
            ));
        }

        if scheduler.idle_wait_ms == 0 {
            result.add_error(ValidationError::new(
                "scheduler.idle_wait_ms",
                "idle_wait_ms must be greater than 0",
            ));
        }

        if scheduler.misfire_threshold_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "scheduler.misfire_threshold_ms",
                "misfire_threshold_ms is 0, every late fire counts as a misfire",
            ));
        }

        if scheduler.event_history == 0 {
            result.add_warning(ValidationWarning::new(
                "scheduler.event_history",
                "event_history is 0, no fire events will be kept",
            ));
        }
    }

    fn validate_store(config: &Config, result: &mut ValidationResult) {
        match (config.store.backend, &config.store.path) {
            (StoreBackend::Sqlite, None) => {
                result.add_warning(ValidationWarning::new(
                    "store.path",
                    "SQLite backend path not set, will use default location",
                ));
            }
            (StoreBackend::Sqlite, Some(path)) => {
                let expanded = ConfigLoader::expand_path(path);
                let parent = Path::new(&expanded).parent();
                if parent.is_some_and(|p| !p.as_os_str().is_empty() && !p.exists()) {
                    result.add_warning(ValidationWarning::new(
                        "store.path",
                        format!("Directory of {} does not exist and will be created", expanded),
                    ));
                }
            }
            (StoreBackend::Memory, Some(_)) => {
                result.add_warning(ValidationWarning::new(
                    "store.path",
                    "store.path is ignored by the memory backend",
                ));
            }
            (StoreBackend::Memory, None) => {}
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if config.logging.level.trim().is_empty() {
            result.add_error(ValidationError::new(
                "logging.level",
                "Log level cannot be empty",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
