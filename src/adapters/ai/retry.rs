//! Retry policy for classifier calls.

use rand::Rng;
use std::time::Duration;

/// Upper bound on the per-attempt timeout.
pub const MAX_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded exponential backoff with uniform jitter.
///
/// Delay before retry `n` (0-based) is `base * 2^n` plus a jitter drawn
/// uniformly from `[0, 1)` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first call included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub jitter: bool,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            multiplier: 2.0,
            jitter: true,
            attempt_timeout: MAX_ATTEMPT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sets the per-attempt timeout, capped at 30 seconds.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout.min(MAX_ATTEMPT_TIMEOUT);
        self
    }

    /// Policy with no waiting, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::default()
            .with_max_attempts(max_attempts)
            .with_base_delay(Duration::ZERO)
            .with_jitter(false)
    }

    /// Deterministic part of the delay before retry `retry` (0-based).
    pub fn base_backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.powi(retry as i32);
        Duration::from_secs_f64(self.base_delay.as_secs_f64() * factor)
    }

    /// Full delay before retry `retry`, jitter included.
    pub fn backoff(&self, retry: u32) -> Duration {
        let base = self.base_backoff(retry);
        if !self.jitter {
            return base;
        }
        let mut rng = rand::thread_rng();
        base + Duration::from_secs_f64(rng.gen_range(0.0..1.0))
    }

    /// True if attempt number `attempt` (1-based) may be followed by another.
    pub fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
