//! Scenario engine

use super::running::{RunId, RunningScenarioSet};
use crate::container::ContainerControl;
use crate::error::{EngineError, EngineResult};
use crate::push::EntropyPusher;
use crate::registry::ServiceRegistry;
use crate::storage::StateStore;
use entropy_types::{
    EntropyKind, EntropyPatch, EntropySettings, Scenario, ScenarioStep, StepAction,
    UnsupportedStep,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A step that was abandoned during a run
#[derive(Debug, Clone, Serialize)]
pub struct StepFailure {
    pub index: usize,
    pub service_id: String,
    pub error: String,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub run_id: RunId,
    pub scenario: String,
    pub steps_total: usize,
    pub failures: Vec<StepFailure>,
}

impl ScenarioReport {
    pub fn steps_succeeded(&self) -> usize {
        self.steps_total - self.failures.len()
    }
}

/// Applies entropy to services and drives scenario runs
pub struct ScenarioEngine {
    store: Arc<dyn StateStore>,
    registry: Arc<ServiceRegistry>,
    pusher: Arc<dyn EntropyPusher>,
    containers: Arc<dyn ContainerControl>,
    running: Arc<RunningScenarioSet>,
}

impl ScenarioEngine {
    pub fn new(
        store: Arc<dyn StateStore>,
        registry: Arc<ServiceRegistry>,
        pusher: Arc<dyn EntropyPusher>,
        containers: Arc<dyn ContainerControl>,
        running: Arc<RunningScenarioSet>,
    ) -> Self {
        Self {
            store,
            registry,
            pusher,
            containers,
            running,
        }
    }

    /// Start a run on its own task and return immediately
    ///
    /// The run is registered before this returns, so it is visible in the
    /// running set as soon as the caller gets its id.
    pub fn spawn(self: &Arc<Self>, scenario: Scenario) -> (RunId, JoinHandle<ScenarioReport>) {
        let run_id = self.running.register(&scenario.name);
        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move { engine.execute(run_id, &scenario).await });
        (run_id, handle)
    }

    /// Run a scenario to completion on the current task
    pub async fn run(&self, scenario: &Scenario) -> ScenarioReport {
        let run_id = self.running.register(&scenario.name);
        self.execute(run_id, scenario).await
    }

    async fn execute(&self, run_id: RunId, scenario: &Scenario) -> ScenarioReport {
        tracing::info!(
            scenario = %scenario.name,
            run_id = %run_id,
            steps = scenario.steps.len(),
            "Scenario started"
        );

        let mut failures = Vec::new();
        for (index, step) in scenario.steps.iter().enumerate() {
            match self.apply_step(step).await {
                Ok(()) => {
                    tracing::info!(
                        scenario = %scenario.name,
                        step = index,
                        service_id = %step.service_id,
                        "Scenario step applied"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        scenario = %scenario.name,
                        step = index,
                        service_id = %step.service_id,
                        error = %e,
                        "Scenario step failed, continuing"
                    );
                    failures.push(StepFailure {
                        index,
                        service_id: step.service_id.clone(),
                        error: e.to_string(),
                    });
                }
            }

            let pause = step.pause();
            if !pause.is_zero() {
                tracing::debug!(
                    scenario = %scenario.name,
                    step = index,
                    seconds = pause.as_secs_f64(),
                    "Pausing before next step"
                );
                tokio::time::sleep(pause).await;
            }
        }

        if !self.running.complete(run_id) {
            tracing::debug!(run_id = %run_id, "Run was already cleared by a reset");
        }

        tracing::info!(
            scenario = %scenario.name,
            run_id = %run_id,
            failed_steps = failures.len(),
            "Scenario finished"
        );

        ScenarioReport {
            run_id,
            scenario: scenario.name.clone(),
            steps_total: scenario.steps.len(),
            failures,
        }
    }

    /// Execute a single step
    pub async fn apply_step(&self, step: &ScenarioStep) -> EngineResult<()> {
        match &step.action {
            StepAction::Entropy { kind, value } => {
                self.apply_patch(&step.service_id, &EntropyPatch::single(*kind, *value))
                    .await
                    .map(|_| ())
            }
            StepAction::Container { action, params } => {
                self.containers
                    .apply(&step.service_id, *action, params)
                    .await
            }
            StepAction::Unsupported { reason } => Err(match reason {
                UnsupportedStep::EntropyKind(kind) => EngineError::UnknownEntropyKind {
                    service_id: step.service_id.clone(),
                    kind: kind.clone(),
                },
                UnsupportedStep::ContainerAction(action) => {
                    EngineError::UnknownContainerAction(action.clone())
                }
                UnsupportedStep::MissingValue => EngineError::InvalidStep {
                    service_id: step.service_id.clone(),
                    reason: reason.to_string(),
                },
            }),
        }
    }

    /// Validate, store and push a partial entropy update
    ///
    /// Every kind in the patch must have a control endpoint on the service
    /// before anything is written. The merged record is stored first, then
    /// each changed value is pushed; the first failed push is returned and
    /// the store keeps the merged record.
    pub async fn apply_patch(
        &self,
        service_id: &str,
        patch: &EntropyPatch,
    ) -> EngineResult<EntropySettings> {
        let changes = patch.changes();
        let service = self.registry.require(service_id)?;
        for (kind, _) in &changes {
            self.registry.require_endpoint(service_id, *kind)?;
        }

        let merged = self.store.merge(service_id, patch).await;

        for (kind, value) in changes {
            self.pusher.push(service, kind, value).await?;
            tracing::info!(service_id = %service_id, kind = %kind, value, "Entropy applied");
        }
        Ok(merged)
    }

    /// Apply one entropy value
    pub async fn apply_entropy(
        &self,
        service_id: &str,
        kind: EntropyKind,
        value: f64,
    ) -> EngineResult<EntropySettings> {
        self.apply_patch(service_id, &EntropyPatch::single(kind, value))
            .await
    }

    pub fn running(&self) -> &Arc<RunningScenarioSet> {
        &self.running
    }
}
