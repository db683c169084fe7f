//! Exponential backoff for push channel reconnection

use std::time::Duration;

use rand::Rng;

use crate::config::PushConfig;

/// Exponential backoff configuration
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay for the first reconnect in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
    /// Multiplier for exponential growth
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
    /// Automatic attempts allowed before giving up
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000, // 30 seconds
            multiplier: 2.0,
            jitter_factor: 0.0,
            max_attempts: 5,
        }
    }
}

impl From<&PushConfig> for BackoffConfig {
    fn from(config: &PushConfig) -> Self {
        Self {
            initial_delay_ms: config.initial_delay_ms,
            max_delay_ms: config.max_delay_ms,
            multiplier: 2.0,
            jitter_factor: if config.jitter_factor.is_finite() {
                config.jitter_factor.clamp(0.0, 1.0)
            } else {
                0.0
            },
            max_attempts: config.max_attempts,
        }
    }
}

/// Capped exponential backoff: `min(initial * multiplier^attempt, max)`
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    config: BackoffConfig,
    attempt: u32,
}

impl ReconnectBackoff {
    pub fn new() -> Self {
        Self::with_config(BackoffConfig::default())
    }

    pub fn with_config(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Delay for a given attempt, before jitter
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base_delay = self.config.initial_delay_ms as f64 * self.config.multiplier.powi(exponent);
        let capped_delay = base_delay.min(self.config.max_delay_ms as f64);

        Duration::from_millis(capped_delay as u64)
    }

    /// Delay for the next attempt, advancing the counter.
    ///
    /// Returns `None` once `max_attempts` delays have been handed out.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        let delay = self.apply_jitter(self.delay_for_attempt(self.attempt));
        self.attempt += 1;
        Some(delay)
    }

    fn apply_jitter(&self, delay: Duration) -> Duration {
        let millis = delay.as_millis() as f64;
        let jitter_range = millis * self.config.jitter_factor;
        if !jitter_range.is_finite() || jitter_range <= 0.0 {
            return delay;
        }

        let jitter = rand::rng().random_range(-jitter_range..jitter_range);
        Duration::from_millis((millis + jitter).max(1.0) as u64)
    }

    /// Reset the backoff to initial state
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of delays handed out since the last reset
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.config.max_attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new()
    }
}
