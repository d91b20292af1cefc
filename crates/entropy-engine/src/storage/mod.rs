//! Storage layer for entropy-engine
//!
//! Caches the entropy settings the control plane last applied to each
//! service. The cache is for reads and observability; the services themselves
//! own the settings they enforce.

mod memory;
mod traits;

pub use memory::InMemoryStateStore;
pub use traits::StateStore;
