//! Entropy Types - Core types for the entropy harness
//!
//! The entropy harness injects latency, errors and throughput throttling into a
//! set of independently running services and drives timed fault-injection
//! scenarios against them.
//!
//! ## Key Concepts
//!
//! - **EntropySettings**: the fault-injection parameters enforced by one service
//! - **ServiceDescriptor**: where a service lives and which paths control its entropy
//! - **Scenario**: a named, ordered sequence of timed steps
//! - **Definitions**: declarative service and scenario files loaded at startup

#![deny(unsafe_code)]

pub mod definitions;
pub mod entropy;
pub mod scenario;
pub mod service;

pub use definitions::{load_scenarios, load_services, DefinitionError, ServicesFile};
pub use entropy::{
    seconds_to_duration, EntropyKind, EntropyPatch, EntropySettings, UnknownEntropyKind,
};
pub use scenario::{ContainerAction, Scenario, ScenarioStep, StepAction, UnsupportedStep};
pub use service::ServiceDescriptor;
