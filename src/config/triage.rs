//! Triage workflow tunables

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::triage::{DEFAULT_SESSION_TTL_MINUTES, MAX_CLARIFICATION_ATTEMPTS};

#[derive(Debug, Clone, Deserialize)]
pub struct TriageConfig {
    /// Minutes a pending session waits for the user's reply
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: i64,

    /// Clarification turns before escalating to a human
    #[serde(default = "default_max_attempts")]
    pub max_clarification_attempts: u32,

    /// Seconds a first-turn classification stays cached
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl TriageConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_ttl_minutes <= 0 {
            return Err(ValidationError::MustBePositive("TRIAGE__SESSION_TTL_MINUTES"));
        }
        if self.max_clarification_attempts == 0 {
            return Err(ValidationError::MustBePositive(
                "TRIAGE__MAX_CLARIFICATION_ATTEMPTS",
            ));
        }
        Ok(())
    }
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            session_ttl_minutes: default_session_ttl(),
            max_clarification_attempts: default_max_attempts(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_session_ttl() -> i64 {
    DEFAULT_SESSION_TTL_MINUTES
}

fn default_max_attempts() -> u32 {
    MAX_CLARIFICATION_ATTEMPTS
}

fn default_cache_ttl() -> u64 {
    300
}
