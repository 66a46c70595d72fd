//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `TICKET_TRIAGE` prefix
//! and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use ticket_triage::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Sessions live {} minutes", config.triage.session_ttl_minutes);
//! ```

mod ai;
mod database;
mod error;
mod glpi;
mod logging;
mod redis;
mod triage;

pub use ai::{AiConfig, MAX_CLASSIFIER_TIMEOUT_SECS};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use glpi::GlpiConfig;
pub use logging::LoggingConfig;
pub use redis::RedisConfig;
pub use triage::TriageConfig;

use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "TICKET_TRIAGE";

/// Root application configuration
///
/// Every section has defaults; only the classifier API key is always
/// required, and the database URL when sessions are stored in PostgreSQL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub redis: RedisConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub glpi: GlpiConfig,

    #[serde(default)]
    pub triage: TriageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads `.env` if present, then `TICKET_TRIAGE__*` variables:
    ///
    /// - `TICKET_TRIAGE__DATABASE__URL=...` -> `database.url`
    /// - `TICKET_TRIAGE__GLPI__SYNC_MODE=glpi_only` -> `glpi.sync_mode`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed into its type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Like [`load`](Self::load), with an explicit env file that must exist.
    pub fn load_with_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Self::from_env()
    }

    fn from_env() -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate every section, database included.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.validate_without_database()
    }

    /// Validation for runs on in-memory storage.
    pub fn validate_without_database(&self) -> Result<(), ValidationError> {
        self.redis.validate()?;
        self.ai.validate()?;
        self.glpi.validate()?;
        self.triage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::SyncMode;
    use secrecy::ExposeSecret;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "TICKET_TRIAGE__DATABASE__URL",
        "TICKET_TRIAGE__AI__API_KEY",
        "TICKET_TRIAGE__AI__MODEL",
        "TICKET_TRIAGE__GLPI__ENABLED",
        "TICKET_TRIAGE__GLPI__API_URL",
        "TICKET_TRIAGE__GLPI__APP_TOKEN",
        "TICKET_TRIAGE__GLPI__USER_TOKEN",
        "TICKET_TRIAGE__GLPI__SYNC_MODE",
        "TICKET_TRIAGE__TRIAGE__SESSION_TTL_MINUTES",
    ];

    fn set_minimal_env() {
        env::set_var("TICKET_TRIAGE__DATABASE__URL", "postgresql://test@localhost/triage");
        env::set_var("TICKET_TRIAGE__AI__API_KEY", "sk-test");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/triage");
        assert_eq!(config.ai.api_key.unwrap().expose_secret(), "sk-test");
        assert_eq!(config.triage.session_ttl_minutes, 30);
        assert!(!config.glpi.enabled);
    }

    #[test]
    fn minimal_env_validates() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().validate().is_ok());
    }

    #[test]
    fn memory_mode_does_not_need_database() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TICKET_TRIAGE__AI__API_KEY", "sk-test");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_err());
        assert!(config.validate_without_database().is_ok());
    }

    #[test]
    fn glpi_section_is_read() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("TICKET_TRIAGE__GLPI__ENABLED", "true");
        env::set_var("TICKET_TRIAGE__GLPI__API_URL", "https://glpi.example.com/apirest.php");
        env::set_var("TICKET_TRIAGE__GLPI__APP_TOKEN", "app");
        env::set_var("TICKET_TRIAGE__GLPI__USER_TOKEN", "user");
        env::set_var("TICKET_TRIAGE__GLPI__SYNC_MODE", "glpi_only");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.glpi.enabled);
        assert_eq!(config.glpi.sync_mode, SyncMode::GlpiOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn numeric_overrides_are_parsed() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("TICKET_TRIAGE__TRIAGE__SESSION_TTL_MINUTES", "45");
        let result = AppConfig::load();
        clear_env();

        assert_eq!(result.unwrap().triage.session_ttl_minutes, 45);
    }

    #[test]
    fn env_file_is_loaded() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TICKET_TRIAGE__AI__API_KEY=sk-from-file").unwrap();
        writeln!(file, "TICKET_TRIAGE__AI__MODEL=gpt-4o").unwrap();

        let result = AppConfig::load_with_env_file(file.path());
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.model, "gpt-4o");
        assert!(config.ai.has_api_key());
    }

    #[test]
    fn missing_env_file_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load_with_env_file(dir.path().join("absent.env"));
        assert!(matches!(result, Err(ConfigError::EnvFile(_))));
    }
}
