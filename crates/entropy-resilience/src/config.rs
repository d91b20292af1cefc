//! Configuration for the resilience layers

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip the breaker open
    pub failure_threshold: u32,

    /// Time the breaker stays open before allowing a trial call
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

/// Exponential backoff retry policy
///
/// The wait after failed attempt `n` (1-based) is
/// `multiplier * 2^(n-1)` seconds, bounded to `[min_wait, max_wait]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Backoff multiplier in seconds
    pub multiplier: f64,

    /// Lower bound on the wait between attempts
    pub min_wait: Duration,

    /// Upper bound on the wait between attempts
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: 1.0,
            min_wait: Duration::from_secs(4),
            max_wait: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait to apply after the given failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(62) as i32;
        let raw = self.multiplier * 2f64.powi(exponent);
        let min = self.min_wait.as_secs_f64();
        let max = self.max_wait.as_secs_f64().max(min);

        let secs = if raw.is_finite() { raw.clamp(min, max) } else { max };
        Duration::from_secs_f64(secs)
    }
}
