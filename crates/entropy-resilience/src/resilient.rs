//! Retry around a circuit breaker around one attempt.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{CircuitBreakerConfig, RetryPolicy};
use crate::error::{AttemptError, ResilienceError};

/// Outcome of one `execute` call, as reported upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Success,
    CircuitOpen,
    RetryExhausted,
}

/// Counters of call outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStats {
    pub successes: u64,
    pub circuit_open: u64,
    pub retry_exhausted: u64,
    pub attempts: u64,
}

#[derive(Debug, Default)]
struct Counters {
    successes: AtomicU64,
    circuit_open: AtomicU64,
    retry_exhausted: AtomicU64,
    attempts: AtomicU64,
}

/// A call wrapper that owns a circuit breaker and a retry policy.
///
/// `execute` runs the retry loop; each attempt asks the breaker for a permit,
/// runs the operation (bounded by the optional per-attempt timeout) and
/// reports the result back to the breaker. An open breaker ends the call at
/// once with [`ResilienceError::CircuitOpen`] instead of waiting out the
/// remaining attempts.
#[derive(Clone)]
pub struct ResilientCall {
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    attempt_timeout: Option<Duration>,
    counters: Arc<Counters>,
}

impl ResilientCall {
    /// Create a wrapper for a named dependency.
    pub fn new(
        dependency: impl Into<String>,
        breaker: CircuitBreakerConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self::with_breaker(Arc::new(CircuitBreaker::new(dependency, breaker)), retry)
    }

    /// Create a wrapper around an existing, possibly shared, breaker.
    pub fn with_breaker(breaker: Arc<CircuitBreaker>, retry: RetryPolicy) -> Self {
        Self {
            breaker,
            retry,
            attempt_timeout: None,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Bound every attempt by a timeout.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// The breaker guarding each attempt.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// The retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Outcome counters since creation.
    pub fn stats(&self) -> CallStats {
        CallStats {
            successes: self.counters.successes.load(Ordering::Relaxed),
            circuit_open: self.counters.circuit_open.load(Ordering::Relaxed),
            retry_exhausted: self.counters.retry_exhausted.load(Ordering::Relaxed),
            attempts: self.counters.attempts.load(Ordering::Relaxed),
        }
    }

    /// Run an operation under retry and circuit breaking.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let dependency = self.breaker.name();
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let Some(permit) = self.breaker.try_acquire() else {
                self.counters.circuit_open.fetch_add(1, Ordering::Relaxed);
                error!(
                    dependency = %dependency,
                    attempt,
                    outcome = "circuit_open",
                    "Dependency unavailable, circuit breaker open"
                );
                return Err(ResilienceError::CircuitOpen {
                    dependency: dependency.to_string(),
                });
            };

            self.counters.attempts.fetch_add(1, Ordering::Relaxed);
            let result = match self.attempt_timeout {
                Some(limit) => match tokio::time::timeout(limit, operation()).await {
                    Ok(result) => result.map_err(AttemptError::Failed),
                    Err(_) => Err(AttemptError::TimedOut(limit)),
                },
                None => operation().await.map_err(AttemptError::Failed),
            };

            let failure = match result {
                Ok(value) => {
                    permit.success();
                    self.counters.successes.fetch_add(1, Ordering::Relaxed);
                    debug!(dependency = %dependency, attempt, outcome = "success", "Call succeeded");
                    return Ok(value);
                }
                Err(failure) => {
                    permit.failure();
                    failure
                }
            };

            if attempt >= max_attempts {
                self.counters.retry_exhausted.fetch_add(1, Ordering::Relaxed);
                error!(
                    dependency = %dependency,
                    attempts = attempt,
                    error = %failure,
                    outcome = "retry_exhausted",
                    "Dependency call failed after all attempts"
                );
                return Err(ResilienceError::RetryExhausted {
                    dependency: dependency.to_string(),
                    attempts: attempt,
                    last: failure,
                });
            }

            let delay = self.retry.delay_for(attempt);
            warn!(
                dependency = %dependency,
                attempt,
                error = %failure,
                delay_ms = delay.as_millis() as u64,
                "Call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

impl fmt::Debug for ResilientCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientCall")
            .field("breaker", &self.breaker)
            .field("retry", &self.retry)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}
