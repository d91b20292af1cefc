//! Storage trait definitions

use async_trait::async_trait;
use entropy_types::{EntropyPatch, EntropySettings};
use std::collections::BTreeMap;

/// Cache of entropy settings keyed by service id
///
/// Implementations provide their own synchronization: every method may be
/// called concurrently from API handlers, scenario runs and the reset
/// coordinator.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Settings for a service, or baseline settings if never written
    async fn get(&self, service_id: &str) -> EntropySettings;

    /// Settings for a service if they were ever written
    async fn lookup(&self, service_id: &str) -> Option<EntropySettings>;

    /// Replace the whole record (last writer wins)
    async fn set(&self, service_id: &str, settings: EntropySettings);

    /// Apply a partial update onto the stored record in one step and return
    /// the merged result
    async fn merge(&self, service_id: &str, patch: &EntropyPatch) -> EntropySettings;

    /// Every stored record, ordered by service id
    async fn list(&self) -> BTreeMap<String, EntropySettings>;
}
