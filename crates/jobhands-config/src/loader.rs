//! Configuration loader.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.jobhands`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StoreBackend;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.scheduler.max_workers, 10);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [scheduler]
            max_workers = 4
            misfire_threshold_ms = 5000
            schedule_on_startup = false

            [store]
            backend = "sqlite"
            path = "/var/lib/jobhands/jobs.db"

            [logging]
            level = "debug"
            json = true
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.scheduler.max_workers, 4);
        assert_eq!(config.scheduler.misfire_threshold_ms, 5000);
        assert_eq!(config.scheduler.idle_wait_ms, 30_000);
        assert!(!config.scheduler.schedule_on_startup);
        assert!(config.scheduler.sync_registered_jobs);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]").unwrap();
        writeln!(file, "port = 5000").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/jobhands.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));

        let config = ConfigLoader::load_or_default(Path::new("/nonexistent/path/jobhands.toml"))
            .unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = ConfigLoader::load_str("[store]\nbackend = \"postgres\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test-only variable with a unique name
        unsafe {
            std::env::set_var("JOBHANDS_TEST_DB_PATH", "/tmp/jobs.db");
        }
        let config = ConfigLoader::load_str("[store]\npath = \"${JOBHANDS_TEST_DB_PATH}\"").unwrap();
        assert_eq!(config.store.path.as_deref(), Some("/tmp/jobs.db"));
        unsafe {
            std::env::remove_var("JOBHANDS_TEST_DB_PATH");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let result = ConfigLoader::expand_env_vars("value = \"${JOBHANDS_UNSET_VAR_12345}\"");
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        assert_eq!(ConfigLoader::expand_env_vars(content).unwrap(), content);
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(ConfigLoader::expand_path("/usr/local/bin"), "/usr/local/bin");
        let expanded = ConfigLoader::expand_path("~/jobs.db");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/jobs.db"));
    }
}
