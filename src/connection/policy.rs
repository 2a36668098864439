use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Reconnection policy for the receive loop.
///
/// After a read failure the loop makes up to `max_attempts` calls to
/// `start()`, sleeping before each one. With `backoff_multiplier = 1.0`
/// the delay is fixed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReconnectPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first attempt (milliseconds)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Upper bound for a grown delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Bound on one dial + subscribe (milliseconds)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_delay_ms() -> u64 {
    5_000
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_connect_timeout_ms() -> u64 {
    30_000
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl ReconnectPolicy {
    /// Fixed delay between a bounded number of attempts
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay_ms: delay.as_millis() as u64,
            backoff_multiplier: 1.0,
            max_delay_ms: delay.as_millis() as u64,
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Delay to wait before attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        let cap = self.max_delay_ms.max(self.delay_ms) as f64;
        let millis = (self.delay_ms as f64 * factor).min(cap);
        Duration::from_millis(millis as u64)
    }

    /// Apply `RECONNECT_MAX_ATTEMPTS`, `RECONNECT_DELAY_MS` and
    /// `RECONNECT_BACKOFF_MULTIPLIER` overrides.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RECONNECT_MAX_ATTEMPTS") {
            match v.parse::<u32>() {
                Ok(n) => self.max_attempts = n,
                Err(_) => warn!(value = %v, "Ignoring invalid RECONNECT_MAX_ATTEMPTS"),
            }
        }
        if let Some(v) = lookup("RECONNECT_DELAY_MS") {
            match v.parse::<u64>() {
                Ok(n) => self.delay_ms = n,
                Err(_) => warn!(value = %v, "Ignoring invalid RECONNECT_DELAY_MS"),
            }
        }
        if let Some(v) = lookup("RECONNECT_BACKOFF_MULTIPLIER") {
            match v.parse::<f64>() {
                Ok(n) if n.is_finite() && n >= 1.0 => self.backoff_multiplier = n,
                _ => warn!(value = %v, "Ignoring invalid RECONNECT_BACKOFF_MULTIPLIER"),
            }
        }
    }
}
