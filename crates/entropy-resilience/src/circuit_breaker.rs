//! Circuit breaker pattern for resilience.
//!
//! Stops calling a failing dependency for a cooldown period after repeated
//! failures, then lets a single trial call decide whether it has recovered.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::CircuitBreakerConfig;

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// Circuit is closed, calls flow normally.
    Closed,

    /// Circuit is open, calls fail immediately.
    Open,

    /// Reset timeout elapsed, one trial call decides the next state.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Success,
    Failure,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    last_transition: DateTime<Utc>,
}

/// Circuit breaker guarding one dependency.
///
/// - Closed: calls allowed, consecutive failures counted
/// - Open: calls rejected until `reset_timeout` has elapsed
/// - Half-Open: exactly one trial call allowed; success closes, failure re-opens
pub struct CircuitBreaker {
    /// Dependency this breaker protects.
    name: String,

    /// Configuration.
    config: CircuitBreakerConfig,

    inner: Mutex<BreakerInner>,
}

/// Permission to run one call through the breaker.
///
/// Dropping a permit without recording an outcome releases a half-open trial
/// slot so that the breaker cannot wedge on a cancelled call.
#[must_use = "record the call outcome on the permit"]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    resolved: bool,
}

impl CallPermit<'_> {
    /// Whether this permit is the half-open trial call.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// Record a successful call.
    pub fn success(mut self) {
        self.resolved = true;
        self.breaker.record(self.trial, Outcome::Success);
    }

    /// Record a failed call.
    pub fn failure(mut self) {
        self.resolved = true;
        self.breaker.record(self.trial, Outcome::Failure);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.trial && !self.resolved {
            let mut inner = self.breaker.inner.lock();
            inner.trial_in_flight = false;
        }
    }
}

impl CircuitBreaker {
    /// Create a closed circuit breaker.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
                trial_in_flight: false,
                last_transition: Utc::now(),
            }),
        }
    }

    /// Name of the protected dependency.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state, moving Open to Half-Open once the reset timeout elapsed.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.check_timeout(&mut inner);
        inner.state
    }

    /// Ask to run one call.
    ///
    /// Returns `None` while the circuit is open, or while a half-open trial
    /// call is already in flight.
    pub fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let mut inner = self.inner.lock();
        self.check_timeout(&mut inner);

        match inner.state {
            CircuitState::Closed => Some(CallPermit {
                breaker: self,
                trial: false,
                resolved: false,
            }),
            CircuitState::Open => None,
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    return None;
                }
                inner.trial_in_flight = true;
                debug!(dependency = %self.name, "Circuit breaker admitting trial call");
                Some(CallPermit {
                    breaker: self,
                    trial: true,
                    resolved: false,
                })
            }
        }
    }

    /// Record a successful operation made without a permit.
    ///
    /// Ignored while half-open, where only the trial call decides.
    pub fn record_success(&self) {
        self.record(false, Outcome::Success);
    }

    /// Record a failed operation made without a permit.
    ///
    /// Ignored while half-open, where only the trial call decides.
    pub fn record_failure(&self) {
        self.record(false, Outcome::Failure);
    }

    fn record(&self, trial: bool, outcome: Outcome) {
        let mut inner = self.inner.lock();

        match (inner.state, outcome) {
            (CircuitState::HalfOpen, _) if !trial => {
                debug!(
                    dependency = %self.name,
                    outcome = ?outcome,
                    "Ignoring outcome of a non-trial call while half-open"
                );
            }
            (CircuitState::Closed, Outcome::Success) => {
                inner.failure_count = 0;
            }
            (CircuitState::Closed, Outcome::Failure) => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    warn!(
                        dependency = %self.name,
                        failures = inner.failure_count,
                        "Circuit breaker opening due to failures"
                    );
                    self.transition_to(&mut inner, CircuitState::Open);
                }
            }
            (CircuitState::HalfOpen, Outcome::Success) => {
                info!(
                    dependency = %self.name,
                    "Circuit breaker closing after successful trial call"
                );
                self.transition_to(&mut inner, CircuitState::Closed);
            }
            (CircuitState::HalfOpen, Outcome::Failure) => {
                warn!(
                    dependency = %self.name,
                    "Circuit breaker re-opening after failed trial call"
                );
                self.transition_to(&mut inner, CircuitState::Open);
            }
            (CircuitState::Open, _) => {
                debug!(
                    dependency = %self.name,
                    outcome = ?outcome,
                    "Outcome recorded while circuit open"
                );
            }
        }
    }

    /// Reset the circuit breaker to closed state.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        info!(
            dependency = %self.name,
            old_state = %inner.state,
            "Circuit breaker reset"
        );
        self.transition_to(&mut inner, CircuitState::Closed);
    }

    /// Time left before an open circuit admits a trial call.
    pub fn remaining_open(&self) -> Option<Duration> {
        let inner = self.inner.lock();
        match (inner.state, inner.opened_at) {
            (CircuitState::Open, Some(opened_at)) => {
                Some(self.config.reset_timeout.saturating_sub(opened_at.elapsed()))
            }
            _ => None,
        }
    }

    /// Get circuit breaker statistics.
    pub fn stats(&self) -> CircuitBreakerStats {
        let mut inner = self.inner.lock();
        self.check_timeout(&mut inner);
        CircuitBreakerStats {
            dependency: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            last_transition: inner.last_transition,
        }
    }

    fn check_timeout(&self, inner: &mut BreakerInner) {
        if inner.state != CircuitState::Open {
            return;
        }
        let Some(opened_at) = inner.opened_at else {
            return;
        };

        if opened_at.elapsed() >= self.config.reset_timeout {
            info!(
                dependency = %self.name,
                "Circuit breaker transitioning to half-open after timeout"
            );
            self.transition_to(inner, CircuitState::HalfOpen);
        }
    }

    fn transition_to(&self, inner: &mut BreakerInner, new_state: CircuitState) {
        inner.state = new_state;
        inner.last_transition = Utc::now();
        inner.trial_in_flight = false;

        match new_state {
            CircuitState::Closed => {
                inner.failure_count = 0;
                inner.opened_at = None;
            }
            CircuitState::Open => {
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {}
        }
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.inner.lock().state)
            .finish()
    }
}

/// Statistics for a circuit breaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerStats {
    /// Protected dependency.
    pub dependency: String,

    /// Current state.
    pub state: CircuitState,

    /// Consecutive failures counted while closed.
    pub failure_count: u32,

    /// Time of last state transition.
    pub last_transition: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(60),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_breaker_closed_to_open() {
        let breaker = CircuitBreaker::new("payment-api", test_config());

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire().is_some());

        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.try_acquire().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failures() {
        let breaker = CircuitBreaker::new("payment-api", test_config());

        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();

        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.stats().failure_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_trial_after_timeout() {
        let breaker = CircuitBreaker::new("payment-api", test_config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        assert!(breaker.try_acquire().is_none());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(breaker.try_acquire().is_none());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        let trial = breaker.try_acquire().expect("trial call admitted");
        assert!(trial.is_trial());
        assert!(breaker.try_acquire().is_none(), "only one trial call at a time");

        trial.success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_trial_reopens_and_restarts_timeout() {
        let breaker = CircuitBreaker::new("payment-api", test_config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        tokio::time::advance(Duration::from_secs(60)).await;

        let trial = breaker.try_acquire().expect("trial call admitted");
        trial.failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(breaker.try_acquire().is_none());
        assert_eq!(breaker.remaining_open(), Some(Duration::from_secs(30)));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(breaker.try_acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_trial_releases_slot() {
        let breaker = CircuitBreaker::new("payment-api", test_config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        tokio::time::advance(Duration::from_secs(60)).await;

        drop(breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(breaker.try_acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_non_trial_outcome_does_not_decide_half_open() {
        let breaker = CircuitBreaker::new("payment-api", test_config());
        let slow_success = breaker.try_acquire().expect("closed admits calls");
        let slow_failure = breaker.try_acquire().expect("closed admits calls");
        assert!(!slow_success.is_trial());

        for _ in 0..3 {
            breaker.record_failure();
        }
        tokio::time::advance(Duration::from_secs(60)).await;

        let trial = breaker.try_acquire().expect("trial call admitted");
        slow_success.success();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        slow_failure.failure();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(breaker.try_acquire().is_none(), "trial still in flight");

        trial.failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_closes() {
        let breaker = CircuitBreaker::new("payment-api", test_config());
        for _ in 0..3 {
            breaker.record_failure();
        }
        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.stats().failure_count, 0);
    }
}
