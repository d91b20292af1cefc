//! Service-local entropy settings

use entropy_types::{EntropyKind, EntropySettings};
use parking_lot::RwLock;
use std::sync::Arc;

/// The settings a protected service enforces.
///
/// This is the authoritative copy; the control plane only caches what it last
/// pushed.
#[derive(Debug, Clone, Default)]
pub struct EntropyState {
    settings: Arc<RwLock<EntropySettings>>,
}

impl EntropyState {
    /// Start at baseline settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at the given settings
    pub fn with_settings(settings: EntropySettings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings.clamped())),
        }
    }

    /// Snapshot of the current settings
    pub fn get(&self) -> EntropySettings {
        *self.settings.read()
    }

    /// Set one kind, clamped, and return the resulting settings
    pub fn set(&self, kind: EntropyKind, value: f64) -> EntropySettings {
        let mut settings = self.settings.write();
        *settings = settings.with(kind, value);
        *settings
    }

    /// Replace all settings
    pub fn replace(&self, settings: EntropySettings) {
        *self.settings.write() = settings.clamped();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clamps_and_keeps_other_fields() {
        let state = EntropyState::new();
        state.set(EntropyKind::Latency, 0.25);
        let settings = state.set(EntropyKind::ErrorRate, 4.0);

        assert_eq!(settings.latency, 0.25);
        assert_eq!(settings.error_rate, 1.0);
        assert_eq!(settings.throughput, 1.0);
    }

    #[test]
    fn test_clones_share_settings() {
        let state = EntropyState::new();
        let other = state.clone();
        other.set(EntropyKind::Throughput, 0.5);
        assert_eq!(state.get().throughput, 0.5);
    }
}
