//! Configuration for shop-services

use entropy_resilience::{CircuitBreakerConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Shop services configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopConfig {
    /// Payment service
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Checkout service
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

/// Payment service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Simulate provider latency and declines
    #[serde(default = "default_true")]
    pub simulate_provider: bool,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8003)),
            simulate_provider: true,
        }
    }
}

/// Checkout service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Base URL of the payment service
    #[serde(default = "default_payment_url")]
    pub payment_url: String,

    /// Breaker around payment calls
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Retry of payment calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Timeout of a single payment attempt in milliseconds
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_ms: u64,
}

impl CheckoutConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8001)),
            payment_url: default_payment_url(),
            breaker: BreakerConfig::default(),
            retry: RetryConfig::default(),
            attempt_timeout_ms: default_attempt_timeout(),
        }
    }
}

/// Circuit breaker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_reset_timeout")]
    pub reset_timeout_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_secs: default_reset_timeout(),
        }
    }
}

impl From<&BreakerConfig> for CircuitBreakerConfig {
    fn from(config: &BreakerConfig) -> Self {
        CircuitBreakerConfig {
            failure_threshold: config.failure_threshold,
            reset_timeout: Duration::from_secs(config.reset_timeout_secs),
        }
    }
}

/// Retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_min_wait")]
    pub min_wait_ms: u64,

    #[serde(default = "default_max_wait")]
    pub max_wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            multiplier: default_multiplier(),
            min_wait_ms: default_min_wait(),
            max_wait_ms: default_max_wait(),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts,
            multiplier: config.multiplier,
            min_wait: Duration::from_millis(config.min_wait_ms),
            max_wait: Duration::from_millis(config.max_wait_ms),
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_payment_url() -> String {
    "http://127.0.0.1:8003".to_string()
}

fn default_attempt_timeout() -> u64 {
    5000
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_min_wait() -> u64 {
    4000
}

fn default_max_wait() -> u64 {
    10_000
}

impl ShopConfig {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&ShopConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with SHOP_ prefix, e.g. SHOP_CHECKOUT__PAYMENT_URL
        builder = builder.add_source(
            config::Environment::with_prefix("SHOP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resilience_defaults() {
        let config = CheckoutConfig::default();

        let breaker = CircuitBreakerConfig::from(&config.breaker);
        assert_eq!(breaker.failure_threshold, 5);
        assert_eq!(breaker.reset_timeout, Duration::from_secs(60));

        let retry = RetryPolicy::from(&config.retry);
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.min_wait, Duration::from_secs(4));
        assert_eq!(retry.max_wait, Duration::from_secs(10));
    }

    #[test]
    fn test_listen_defaults() {
        let config = ShopConfig::default();
        assert_eq!(config.payment.listen_addr.port(), 8003);
        assert_eq!(config.checkout.listen_addr.port(), 8001);
        assert!(config.payment.simulate_provider);
    }
}
