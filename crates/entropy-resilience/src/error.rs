//! Error types for entropy-resilience.

use std::time::Duration;
use thiserror::Error;

/// Why a single attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError<E> {
    /// The operation itself returned an error.
    #[error("{0}")]
    Failed(E),

    /// The attempt did not finish within the per-attempt timeout.
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),
}

/// Failure of a resilient call, distinguishable by the caller.
#[derive(Debug, Error)]
pub enum ResilienceError<E> {
    /// The breaker is open; the dependency was not called.
    #[error("circuit breaker open for {dependency}")]
    CircuitOpen { dependency: String },

    /// Every attempt failed.
    #[error("{dependency} failed after {attempts} attempts: {last}")]
    RetryExhausted {
        dependency: String,
        attempts: u32,
        last: AttemptError<E>,
    },
}

impl<E> ResilienceError<E> {
    /// Whether the breaker short-circuited the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen { .. })
    }

    /// Whether all retry attempts were used up.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, ResilienceError::RetryExhausted { .. })
    }
}
