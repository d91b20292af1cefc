//! Entropy Engine library
//!
//! This module provides the control plane of the entropy harness:
//! - State store caching the entropy settings pushed to each service
//! - Service registry loaded from declarative definitions
//! - Scenario engine running timed fault-injection sequences
//! - Reset coordinator converging every service back to baseline
//! - REST API and server lifecycle

pub mod api;
pub mod config;
pub mod container;
pub mod error;
pub mod push;
pub mod registry;
pub mod reset;
pub mod scenario;
pub mod server;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EngineConfig;
pub use container::{ContainerControl, LoggingContainerControl};
pub use error::{ApiError, EngineError};
pub use push::{EntropyPusher, HttpEntropyPusher};
pub use registry::ServiceRegistry;
pub use reset::{ResetCoordinator, ResetReport};
pub use scenario::{RunningScenarioSet, ScenarioCatalog, ScenarioEngine, ScenarioReport};
pub use server::Server;
pub use storage::{InMemoryStateStore, StateStore};
