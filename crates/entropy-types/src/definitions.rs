//! Loading of declarative service and scenario definitions
//!
//! Services come from a single YAML file with a top-level `services` list.
//! Scenarios come from a directory holding one `*.yml`/`*.yaml` file per
//! scenario. Both are read once at startup.

use crate::{Scenario, ServiceDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading definitions
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// File or directory could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid YAML for the expected shape
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Two services share an identifier
    #[error("duplicate service id: {0}")]
    DuplicateService(String),

    /// Two scenarios share a name
    #[error("duplicate scenario name: {0}")]
    DuplicateScenario(String),
}

/// Shape of the services file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesFile {
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,
}

/// Load service descriptors from a YAML file
pub fn load_services(path: impl AsRef<Path>) -> Result<Vec<ServiceDescriptor>, DefinitionError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ServicesFile =
        serde_yaml::from_str(&contents).map_err(|source| DefinitionError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    for service in &file.services {
        if !seen.insert(service.id.as_str()) {
            return Err(DefinitionError::DuplicateService(service.id.clone()));
        }
    }

    Ok(file.services)
}

/// Load every scenario file in a directory, sorted by file name
pub fn load_scenarios(dir: impl AsRef<Path>) -> Result<Vec<Scenario>, DefinitionError> {
    let dir = dir.as_ref();
    let io_err = |source| DefinitionError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext == "yml" || ext == "yaml");
        if is_yaml {
            paths.push(path);
        }
    }
    paths.sort();

    let mut seen = HashSet::new();
    let mut scenarios = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = std::fs::read_to_string(&path).map_err(|source| DefinitionError::Io {
            path: path.clone(),
            source,
        })?;
        let scenario: Scenario = serde_yaml::from_str(&contents)
            .map_err(|source| DefinitionError::Parse { path, source })?;

        if !seen.insert(scenario.name.clone()) {
            return Err(DefinitionError::DuplicateScenario(scenario.name));
        }
        scenarios.push(scenario);
    }

    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntropyKind, StepAction};
    use std::fs;

    const SERVICES: &str = r#"
services:
  - id: ecommerce-api
    name: E-commerce API
    url: http://ecommerce-api:8000
    entropy_endpoints:
      latency: /entropy/latency
      errors: /entropy/errors
      throughput: /entropy/throughput
  - id: payment-api
    name: Payment API
    url: http://payment-api:8000
    entropy_endpoints:
      latency: /entropy/latency
"#;

    #[test]
    fn test_load_services() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.yml");
        fs::write(&path, SERVICES).unwrap();

        let services = load_services(&path).unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].base_url, "http://ecommerce-api:8000");
        assert_eq!(services[0].endpoint(EntropyKind::ErrorRate), Some("/entropy/errors"));
        assert!(services[1].endpoint(EntropyKind::Throughput).is_none());
    }

    #[test]
    fn test_duplicate_service_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.yml");
        fs::write(
            &path,
            "services:\n  - {id: a, name: A, url: http://a}\n  - {id: a, name: B, url: http://b}\n",
        )
        .unwrap();

        assert!(matches!(
            load_services(&path),
            Err(DefinitionError::DuplicateService(id)) if id == "a"
        ));
    }

    #[test]
    fn test_load_scenarios_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("payment_slowdown.yml"),
            r#"
name: payment-slowdown
description: Slow the payment provider, then recover
steps:
  - type: entropy
    service_id: payment-api
    state:
      latency: 3
    duration: 30
  - type: entropy
    service_id: payment-api
    state:
      latency: 0
"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let scenarios = load_scenarios(dir.path()).unwrap();
        assert_eq!(scenarios.len(), 1);
        let scenario = &scenarios[0];
        assert_eq!(scenario.name, "payment-slowdown");
        assert_eq!(scenario.steps.len(), 2);
        assert!(matches!(
            scenario.steps[0].action,
            StepAction::Entropy { kind: EntropyKind::Latency, value } if value == 3.0
        ));
    }

    #[test]
    fn test_duplicate_scenario_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yml"), "name: same\nsteps: []\n").unwrap();
        fs::write(dir.path().join("b.yaml"), "name: same\nsteps: []\n").unwrap();

        assert!(matches!(
            load_scenarios(dir.path()),
            Err(DefinitionError::DuplicateScenario(name)) if name == "same"
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_services(dir.path().join("absent.yml")),
            Err(DefinitionError::Io { .. })
        ));
    }
}
