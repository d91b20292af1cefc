//! In-memory storage implementation

use super::traits::StateStore;
use async_trait::async_trait;
use entropy_types::{EntropyPatch, EntropySettings};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory state store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStore {
    settings: Arc<RwLock<HashMap<String, EntropySettings>>>,
}

impl InMemoryStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, service_id: &str) -> EntropySettings {
        self.lookup(service_id).await.unwrap_or_default()
    }

    async fn lookup(&self, service_id: &str) -> Option<EntropySettings> {
        let settings = self.settings.read().await;
        settings.get(service_id).copied()
    }

    async fn set(&self, service_id: &str, settings: EntropySettings) {
        let mut all = self.settings.write().await;
        all.insert(service_id.to_string(), settings.clamped());
    }

    async fn merge(&self, service_id: &str, patch: &EntropyPatch) -> EntropySettings {
        // Read and write under one guard so concurrent merges cannot lose updates.
        let mut all = self.settings.write().await;
        let current = all.get(service_id).copied().unwrap_or_default();
        let merged = patch.apply_to(current);
        all.insert(service_id.to_string(), merged);
        merged
    }

    async fn list(&self) -> BTreeMap<String, EntropySettings> {
        let settings = self.settings.read().await;
        settings
            .iter()
            .map(|(id, s)| (id.clone(), *s))
            .collect()
    }
}
