//! Membership of running scenario runs

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Runs currently executing, in start order
///
/// Entries are keyed per run, so a run that completes after a bulk reset
/// cleared the set removes nothing, and concurrent runs of one scenario are
/// tracked separately.
#[derive(Debug, Default)]
pub struct RunningScenarioSet {
    runs: Mutex<Vec<(RunId, String)>>,
}

impl RunningScenarioSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a run
    pub fn register(&self, name: &str) -> RunId {
        let id = RunId::generate();
        self.runs.lock().push((id, name.to_string()));
        id
    }

    /// Record the natural completion of a run
    ///
    /// Returns false if the run was no longer tracked.
    pub fn complete(&self, id: RunId) -> bool {
        let mut runs = self.runs.lock();
        match runs.iter().position(|(run, _)| *run == id) {
            Some(position) => {
                runs.remove(position);
                true
            }
            None => false,
        }
    }

    /// Forget every run and return how many were tracked
    pub fn clear(&self) -> usize {
        let mut runs = self.runs.lock();
        let cleared = runs.len();
        runs.clear();
        cleared
    }

    /// Names of running scenarios, once per run
    pub fn names(&self) -> Vec<String> {
        self.runs.lock().iter().map(|(_, name)| name.clone()).collect()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.runs.lock().iter().any(|(_, n)| n == name)
    }

    pub fn len(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.lock().is_empty()
    }
}
