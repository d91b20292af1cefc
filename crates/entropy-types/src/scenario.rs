//! Scenario definitions
//!
//! A scenario is an ordered list of steps. Each step either pushes one entropy
//! value to one service or asks the container collaborator to act on a
//! service's container, and is followed by an optional pause.
//!
//! Declarative files carry free-form step types and action names. They are
//! resolved into [`StepAction`] once at load time; values that cannot be
//! resolved become [`StepAction::Unsupported`] so that a forward-incompatible
//! file still loads and the offending step is skipped when it runs.

use crate::entropy::seconds_to_duration;
use crate::EntropyKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A named, ordered sequence of timed steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique scenario name
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Steps, executed strictly in order
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

/// One step of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStep")]
pub struct ScenarioStep {
    /// Target service
    pub service_id: String,

    /// What the step does
    #[serde(flatten)]
    pub action: StepAction,

    /// Seconds to pause after the step runs
    pub duration: f64,
}

impl ScenarioStep {
    /// Entropy step
    pub fn entropy(service_id: impl Into<String>, kind: EntropyKind, value: f64) -> Self {
        Self {
            service_id: service_id.into(),
            action: StepAction::Entropy { kind, value },
            duration: 0.0,
        }
    }

    /// Container step
    pub fn container(
        service_id: impl Into<String>,
        action: ContainerAction,
        params: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            action: StepAction::Container { action, params },
            duration: 0.0,
        }
    }

    /// Set the pause that follows this step
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    /// Pause after this step; zero when the duration is not positive or not
    /// finite, saturating at [`Duration::MAX`]
    pub fn pause(&self) -> Duration {
        if self.duration.is_finite() {
            seconds_to_duration(self.duration)
        } else {
            Duration::ZERO
        }
    }
}

/// What a scenario step does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepAction {
    /// Push one entropy value to the service's control endpoint
    Entropy { kind: EntropyKind, value: f64 },

    /// Delegate to the container-control collaborator
    Container {
        action: ContainerAction,
        #[serde(default)]
        params: serde_json::Map<String, serde_json::Value>,
    },

    /// A step the definition file describes but this build cannot run
    Unsupported { reason: UnsupportedStep },
}

/// Why a declared step cannot run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum UnsupportedStep {
    /// Entropy kind name not recognized
    EntropyKind(String),

    /// Container action name not recognized
    ContainerAction(String),

    /// Entropy step without a numeric value
    MissingValue,
}

impl fmt::Display for UnsupportedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedStep::EntropyKind(kind) => write!(f, "unknown entropy kind '{}'", kind),
            UnsupportedStep::ContainerAction(action) => {
                write!(f, "unknown container action '{}'", action)
            }
            UnsupportedStep::MissingValue => write!(f, "entropy step has no numeric value"),
        }
    }
}

/// Container-control actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerAction {
    SetEnv,
    SetResources,
    DisconnectNetwork,
    ConnectNetwork,
    Stop,
    Start,
}

impl ContainerAction {
    /// Resolve an action name from a definition file or API call
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "set_env" => Some(ContainerAction::SetEnv),
            "set_resources" => Some(ContainerAction::SetResources),
            "disconnect_network" => Some(ContainerAction::DisconnectNetwork),
            "connect_network" => Some(ContainerAction::ConnectNetwork),
            "stop" => Some(ContainerAction::Stop),
            "start" => Some(ContainerAction::Start),
            _ => None,
        }
    }

    /// Action name as it appears in definition files
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerAction::SetEnv => "set_env",
            ContainerAction::SetResources => "set_resources",
            ContainerAction::DisconnectNetwork => "disconnect_network",
            ContainerAction::ConnectNetwork => "connect_network",
            ContainerAction::Stop => "stop",
            ContainerAction::Start => "start",
        }
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step as written in a declarative file
///
/// `type: docker` marks a container step; any other type is an entropy step
/// whose `state` holds a single `kind: value` pair.
#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(rename = "type", default)]
    step_type: String,
    service_id: String,
    #[serde(default)]
    state: Option<serde_yaml::Mapping>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    params: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    duration: f64,
}

impl From<RawStep> for ScenarioStep {
    fn from(raw: RawStep) -> Self {
        let action = match raw.step_type.as_str() {
            "docker" | "container" => resolve_container(raw.action.as_deref(), raw.params),
            _ => resolve_entropy(raw.kind, raw.value, raw.state),
        };

        Self {
            service_id: raw.service_id,
            action,
            duration: raw.duration,
        }
    }
}

fn resolve_container(
    action: Option<&str>,
    params: serde_json::Map<String, serde_json::Value>,
) -> StepAction {
    let name = action.unwrap_or_default();
    match ContainerAction::parse(name) {
        Some(action) => StepAction::Container { action, params },
        None => StepAction::Unsupported {
            reason: UnsupportedStep::ContainerAction(name.to_string()),
        },
    }
}

fn resolve_entropy(
    kind: Option<String>,
    value: Option<f64>,
    state: Option<serde_yaml::Mapping>,
) -> StepAction {
    // The flat `kind`/`value` form is what a serialized scenario looks like;
    // files written by hand use `state: {latency: 2}`. Only the first pair of
    // `state` is used.
    let pair = match (kind, value) {
        (Some(kind), value) => Some((kind, value)),
        (None, _) => state.and_then(|state| {
            state.into_iter().next().map(|(key, value)| {
                let name = key.as_str().map(str::to_string).unwrap_or_default();
                (name, value.as_f64())
            })
        }),
    };

    match pair {
        None | Some((_, None)) => StepAction::Unsupported {
            reason: UnsupportedStep::MissingValue,
        },
        Some((name, Some(value))) => match name.parse::<EntropyKind>() {
            Ok(kind) => StepAction::Entropy { kind, value },
            Err(_) => StepAction::Unsupported {
                reason: UnsupportedStep::EntropyKind(name),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_step(yaml: &str) -> ScenarioStep {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_entropy_step_from_state() {
        let step = parse_step("type: entropy\nservice_id: payment-api\nstate:\n  latency: 2\nduration: 10\n");
        assert_eq!(step.service_id, "payment-api");
        assert_eq!(
            step.action,
            StepAction::Entropy {
                kind: EntropyKind::Latency,
                value: 2.0
            }
        );
        assert_eq!(step.pause(), Duration::from_secs(10));
    }

    #[test]
    fn test_errors_key_maps_to_error_rate() {
        let step = parse_step("type: http\nservice_id: ecommerce-api\nstate:\n  errors: 0.5\n");
        assert_eq!(
            step.action,
            StepAction::Entropy {
                kind: EntropyKind::ErrorRate,
                value: 0.5
            }
        );
        assert_eq!(step.pause(), Duration::ZERO);
    }

    #[test]
    fn test_docker_step() {
        let step = parse_step(
            "type: docker\nservice_id: redis\naction: disconnect_network\nparams: {}\nduration: 5\n",
        );
        assert!(matches!(
            step.action,
            StepAction::Container {
                action: ContainerAction::DisconnectNetwork,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_values_become_unsupported() {
        let step = parse_step("type: docker\nservice_id: redis\naction: explode\n");
        assert_eq!(
            step.action,
            StepAction::Unsupported {
                reason: UnsupportedStep::ContainerAction("explode".to_string())
            }
        );

        let step = parse_step("type: entropy\nservice_id: redis\nstate:\n  cpu: 0.9\n");
        assert_eq!(
            step.action,
            StepAction::Unsupported {
                reason: UnsupportedStep::EntropyKind("cpu".to_string())
            }
        );

        let step = parse_step("type: entropy\nservice_id: redis\n");
        assert_eq!(
            step.action,
            StepAction::Unsupported {
                reason: UnsupportedStep::MissingValue
            }
        );
    }

    #[test]
    fn test_serialized_step_reloads() {
        let step = ScenarioStep::entropy("auth-api", EntropyKind::Throughput, 0.25).with_duration(3.0);
        let json = serde_json::to_string(&step).unwrap();
        let reloaded: ScenarioStep = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, step);
    }

    #[test]
    fn test_negative_duration_does_not_pause() {
        let step = ScenarioStep::entropy("auth-api", EntropyKind::Latency, 1.0).with_duration(-4.0);
        assert_eq!(step.pause(), Duration::ZERO);
    }

    #[test]
    fn test_huge_duration_saturates() {
        let step: ScenarioStep = serde_yaml::from_str(
            "type: entropy\nservice_id: auth-api\nstate:\n  latency: 1\nduration: 1.0e30\n",
        )
        .unwrap();
        assert_eq!(step.pause(), Duration::MAX);

        let step = ScenarioStep::entropy("auth-api", EntropyKind::Latency, 1.0)
            .with_duration(f64::INFINITY);
        assert_eq!(step.pause(), Duration::ZERO);
    }
}
