//! Caller-side resilience for calls into services running under injected entropy.
//!
//! Two layers are composed explicitly by [`ResilientCall`]:
//!
//! - a [`RetryPolicy`] that re-attempts a failed call with exponential backoff
//! - a [`CircuitBreaker`] that guards each single attempt and fails fast while
//!   the dependency is considered down
//!
//! The breaker wraps one attempt, the retry loop wraps the breaker, so every
//! retry attempt independently counts toward tripping the breaker.

pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod resilient;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerStats, CircuitState};
pub use config::{CircuitBreakerConfig, RetryPolicy};
pub use error::{AttemptError, ResilienceError};
pub use resilient::{CallOutcome, CallStats, ResilientCall};
