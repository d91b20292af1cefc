//! Loaded scenarios

use crate::error::{EngineError, EngineResult};
use entropy_types::Scenario;
use std::collections::HashMap;

/// Scenarios loaded at startup, addressable by unique name
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
    index: HashMap<String, usize>,
}

impl ScenarioCatalog {
    /// Build a catalog, rejecting duplicate names
    pub fn new(scenarios: Vec<Scenario>) -> EngineResult<Self> {
        let mut index = HashMap::with_capacity(scenarios.len());
        for (position, scenario) in scenarios.iter().enumerate() {
            if index.insert(scenario.name.clone(), position).is_some() {
                return Err(EngineError::Config(format!(
                    "duplicate scenario name: {}",
                    scenario.name
                )));
            }
        }
        Ok(Self { scenarios, index })
    }

    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.index.get(name).map(|&i| &self.scenarios[i])
    }

    /// Look up a scenario, failing with `ScenarioNotFound`
    pub fn require(&self, name: &str) -> EngineResult<&Scenario> {
        self.get(name)
            .ok_or_else(|| EngineError::ScenarioNotFound(name.to_string()))
    }

    pub fn all(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(name: &str) -> Scenario {
        Scenario {
            name: name.to_string(),
            description: String::new(),
            steps: Vec::new(),
        }
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = ScenarioCatalog::new(vec![scenario("slow"), scenario("flaky")]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("flaky").is_some());
        assert!(matches!(
            catalog.require("missing"),
            Err(EngineError::ScenarioNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        assert!(ScenarioCatalog::new(vec![scenario("slow"), scenario("slow")]).is_err());
    }
}
