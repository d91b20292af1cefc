//! Scenario execution
//!
//! A scenario runs on its own task and executes its steps strictly in order.
//! Several runs, including runs of the same scenario, may be active at once.

mod catalog;
mod engine;
mod running;

pub use catalog::ScenarioCatalog;
pub use engine::{ScenarioEngine, ScenarioReport, StepFailure};
pub use running::{RunId, RunningScenarioSet};
