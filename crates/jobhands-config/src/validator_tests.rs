//! Tests for the configuration validator.

use super::*;

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_invalid_port() {
    let mut config = Config::default();
    config.server.port = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "server.port"));
}

#[test]
fn test_validate_empty_host() {
    let mut config = Config::default();
    config.server.host = String::new();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "server.host"));
}

#[test]
fn test_validate_zero_workers() {
    let mut config = Config::default();
    config.scheduler.max_workers = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "scheduler.max_workers"));
}

#[test]
fn test_validate_high_workers_warning() {
    let mut config = Config::default();
    config.scheduler.max_workers = 5000;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(!result.warnings.is_empty());
}

#[test]
fn test_validate_zero_idle_wait() {
    let mut config = Config::default();
    config.scheduler.idle_wait_ms = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "scheduler.idle_wait_ms"));
}

#[test]
fn test_validate_sqlite_without_path_warns() {
    let mut config = Config::default();
    config.store.backend = StoreBackend::Sqlite;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "store.path"));
}

#[test]
fn test_validate_memory_with_path_warns() {
    let mut config = Config::default();
    config.store.path = Some("/tmp/jobs.db".to_string());

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "store.path"));
}

#[test]
fn test_validate_empty_log_level() {
    let mut config = Config::default();
    config.logging.level = " ".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "logging.level"));
}

#[test]
fn test_into_error() {
    let mut config = Config::default();
    config.scheduler.max_workers = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    let err = result.into_error().unwrap();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "scheduler.max_workers"));
    assert!(ValidationResult::default().into_error().is_none());
}

#[test]
fn test_validation_result_add_warning() {
    let mut result = ValidationResult::default();
    result.add_warning(ValidationWarning::new("test", "warning"));
    assert!(result.is_valid()); // Warnings don't make it invalid
    assert_eq!(result.warnings.len(), 1);
}
