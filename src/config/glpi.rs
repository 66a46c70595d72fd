//! GLPI ticket-of-record configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::SyncMode;

/// External ticketing settings. Disabled by default.
#[derive(Debug, Clone, Deserialize)]
pub struct GlpiConfig {
    #[serde(default)]
    pub enabled: bool,

    /// REST endpoint, e.g. `https://glpi.example.com/apirest.php`
    #[serde(default)]
    pub api_url: String,

    pub app_token: Option<Secret<String>>,

    pub user_token: Option<Secret<String>>,

    #[serde(default)]
    pub sync_mode: SyncMode,

    /// Seconds a GLPI session token is reused before renewal
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl GlpiConfig {
    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_lifetime_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.api_url.is_empty() {
            return Err(ValidationError::MissingRequired("GLPI__API_URL"));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl("GLPI__API_URL"));
        }
        if !is_set(&self.app_token) {
            return Err(ValidationError::MissingRequired("GLPI__APP_TOKEN"));
        }
        if !is_set(&self.user_token) {
            return Err(ValidationError::MissingRequired("GLPI__USER_TOKEN"));
        }
        Ok(())
    }
}

impl Default for GlpiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: String::new(),
            app_token: None,
            user_token: None,
            sync_mode: SyncMode::default(),
            session_lifetime_secs: default_session_lifetime(),
            timeout_secs: default_timeout(),
        }
    }
}

fn is_set(token: &Option<Secret<String>>) -> bool {
    token.as_ref().is_some_and(|t| !t.expose_secret().is_empty())
}

fn default_session_lifetime() -> u64 {
    3600
}

fn default_timeout() -> u64 {
    30
}
