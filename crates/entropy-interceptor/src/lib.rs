//! Entropy enforcement for protected services.
//!
//! Every protected service installs an [`EntropyInterceptor`] in front of its
//! business handlers and mounts the [`control_router`] beside them. The control
//! plane pushes settings into the control router; the interceptor reads the
//! service's own local copy on every request and may delay, fail or throttle it.
//!
//! ```ignore
//! let entropy = EntropyState::new();
//! let metrics = RequestMetrics::new("payment")?;
//! let app = protect(business_routes, EntropyInterceptor::new(entropy, metrics));
//! ```

pub mod control;
pub mod interceptor;
pub mod metrics;
pub mod shutdown;
pub mod state;

pub use control::control_router;
pub use interceptor::{
    decide, protect, Decision, EntropyInterceptor, Sampler, ThreadRngSampler, UNMATCHED_ENDPOINT,
};
pub use metrics::RequestMetrics;
pub use shutdown::shutdown_signal;
pub use state::EntropyState;
