//! Entropy settings and the kinds of entropy a service can enforce
//!
//! Every value is clamped to its declared domain before it is stored or applied:
//! latency is a non-negative number of seconds, error rate and throughput are
//! probabilities in `[0, 1]`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Kind of entropy that can be injected into a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntropyKind {
    /// Added delay before a request is handled
    Latency,

    /// Probability that a request fails with a server error
    #[serde(rename = "errors", alias = "error_rate")]
    ErrorRate,

    /// Probability that a request is admitted rather than throttled
    Throughput,
}

impl EntropyKind {
    /// All kinds, in the order they are pushed during a reset
    pub const ALL: [EntropyKind; 3] = [
        EntropyKind::Latency,
        EntropyKind::ErrorRate,
        EntropyKind::Throughput,
    ];

    /// Field name the service-side control endpoint expects in its JSON body
    pub fn payload_key(&self) -> &'static str {
        match self {
            EntropyKind::Latency => "latency",
            EntropyKind::ErrorRate => "error_rate",
            EntropyKind::Throughput => "throughput",
        }
    }

    /// Value this kind takes in baseline settings
    pub fn baseline_value(&self) -> f64 {
        match self {
            EntropyKind::Latency | EntropyKind::ErrorRate => 0.0,
            EntropyKind::Throughput => 1.0,
        }
    }

    /// Clamp a raw value into this kind's domain.
    ///
    /// Non-finite input maps to the baseline value for the kind.
    pub fn clamp_value(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.baseline_value();
        }
        match self {
            EntropyKind::Latency => value.max(0.0),
            EntropyKind::ErrorRate | EntropyKind::Throughput => value.clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for EntropyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntropyKind::Latency => write!(f, "latency"),
            EntropyKind::ErrorRate => write!(f, "errors"),
            EntropyKind::Throughput => write!(f, "throughput"),
        }
    }
}

/// An entropy kind name that is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entropy kind: {0}")]
pub struct UnknownEntropyKind(pub String);

impl FromStr for EntropyKind {
    type Err = UnknownEntropyKind;

    /// Accepts both the endpoint name (`errors`) and the canonical field name
    /// (`error_rate`) for the error-rate kind.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latency" => Ok(EntropyKind::Latency),
            "errors" | "error_rate" => Ok(EntropyKind::ErrorRate),
            "throughput" => Ok(EntropyKind::Throughput),
            other => Err(UnknownEntropyKind(other.to_string())),
        }
    }
}

/// Fault-injection parameters for one service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropySettings {
    /// Added latency in seconds
    #[serde(default)]
    pub latency: f64,

    /// Probability in `[0, 1]` that a request fails
    #[serde(default)]
    pub error_rate: f64,

    /// Probability in `[0, 1]` that a request is admitted
    #[serde(default = "default_throughput")]
    pub throughput: f64,
}

fn default_throughput() -> f64 {
    1.0
}

impl Default for EntropySettings {
    fn default() -> Self {
        Self::baseline()
    }
}

impl EntropySettings {
    /// Zero latency, zero error rate, full throughput
    pub const fn baseline() -> Self {
        Self {
            latency: 0.0,
            error_rate: 0.0,
            throughput: 1.0,
        }
    }

    /// Whether these settings inject nothing
    pub fn is_baseline(&self) -> bool {
        *self == Self::baseline()
    }

    /// Read the value for a kind
    pub fn get(&self, kind: EntropyKind) -> f64 {
        match kind {
            EntropyKind::Latency => self.latency,
            EntropyKind::ErrorRate => self.error_rate,
            EntropyKind::Throughput => self.throughput,
        }
    }

    /// Copy of these settings with one kind replaced by a clamped value
    pub fn with(mut self, kind: EntropyKind, value: f64) -> Self {
        let value = kind.clamp_value(value);
        match kind {
            EntropyKind::Latency => self.latency = value,
            EntropyKind::ErrorRate => self.error_rate = value,
            EntropyKind::Throughput => self.throughput = value,
        }
        self
    }

    /// Copy of these settings with every field clamped to its domain
    pub fn clamped(self) -> Self {
        EntropyKind::ALL
            .iter()
            .fold(self, |acc, kind| acc.with(*kind, acc.get(*kind)))
    }

    /// Latency as a duration, saturating at [`Duration::MAX`]
    pub fn latency_duration(&self) -> Duration {
        seconds_to_duration(EntropyKind::Latency.clamp_value(self.latency))
    }
}

/// Convert non-negative seconds to a duration.
///
/// Negative and NaN input yield zero; values too large for a `Duration`
/// saturate at [`Duration::MAX`].
pub fn seconds_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// A partial update of entropy settings
///
/// Unset fields leave the prior value untouched when the patch is merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntropyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<f64>,
}

impl EntropyPatch {
    /// Patch that sets a single kind
    pub fn single(kind: EntropyKind, value: f64) -> Self {
        Self::default().set(kind, value)
    }

    /// Set one kind on this patch
    pub fn set(mut self, kind: EntropyKind, value: f64) -> Self {
        match kind {
            EntropyKind::Latency => self.latency = Some(value),
            EntropyKind::ErrorRate => self.error_rate = Some(value),
            EntropyKind::Throughput => self.throughput = Some(value),
        }
        self
    }

    /// Build a patch from caller-provided field names.
    ///
    /// Field names are normalized onto the canonical kinds, so `errors` and
    /// `error_rate` both address the error rate.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self, UnknownEntropyKind>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        fields.into_iter().try_fold(Self::default(), |patch, (name, value)| {
            let kind: EntropyKind = name.parse()?;
            Ok(patch.set(kind, value))
        })
    }

    /// Kinds touched by this patch with their clamped values, in canonical order
    pub fn changes(&self) -> Vec<(EntropyKind, f64)> {
        EntropyKind::ALL
            .iter()
            .filter_map(|kind| self.value(*kind).map(|v| (*kind, kind.clamp_value(v))))
            .collect()
    }

    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.latency.is_none() && self.error_rate.is_none() && self.throughput.is_none()
    }

    /// Merge this patch onto prior settings
    pub fn apply_to(&self, settings: EntropySettings) -> EntropySettings {
        self.changes()
            .into_iter()
            .fold(settings, |acc, (kind, value)| acc.with(kind, value))
    }

    fn value(&self, kind: EntropyKind) -> Option<f64> {
        match kind {
            EntropyKind::Latency => self.latency,
            EntropyKind::ErrorRate => self.error_rate,
            EntropyKind::Throughput => self.throughput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_defaults() {
        let settings = EntropySettings::default();
        assert_eq!(settings.latency, 0.0);
        assert_eq!(settings.error_rate, 0.0);
        assert_eq!(settings.throughput, 1.0);
        assert!(settings.is_baseline());
    }

    #[test]
    fn test_kind_parsing_normalizes_error_names() {
        assert_eq!("errors".parse::<EntropyKind>().unwrap(), EntropyKind::ErrorRate);
        assert_eq!("error_rate".parse::<EntropyKind>().unwrap(), EntropyKind::ErrorRate);
        assert_eq!("latency".parse::<EntropyKind>().unwrap(), EntropyKind::Latency);
        assert!("cpu".parse::<EntropyKind>().is_err());
    }

    #[test]
    fn test_values_are_clamped() {
        let settings = EntropySettings::baseline()
            .with(EntropyKind::Latency, -3.0)
            .with(EntropyKind::ErrorRate, 1.7)
            .with(EntropyKind::Throughput, -0.2);
        assert_eq!(settings.latency, 0.0);
        assert_eq!(settings.error_rate, 1.0);
        assert_eq!(settings.throughput, 0.0);

        assert_eq!(EntropyKind::Throughput.clamp_value(f64::NAN), 1.0);
        assert_eq!(EntropyKind::Latency.clamp_value(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_huge_latency_saturates() {
        let settings = EntropySettings::baseline().with(EntropyKind::Latency, 1e20);
        assert_eq!(settings.latency, 1e20);
        assert_eq!(settings.latency_duration(), Duration::MAX);

        let settings = EntropySettings::baseline().with(EntropyKind::Latency, f64::MAX);
        assert_eq!(settings.latency_duration(), Duration::MAX);
    }

    #[test]
    fn test_seconds_to_duration() {
        assert_eq!(seconds_to_duration(1.5), Duration::from_millis(1500));
        assert_eq!(seconds_to_duration(0.0), Duration::ZERO);
        assert_eq!(seconds_to_duration(-4.0), Duration::ZERO);
        assert_eq!(seconds_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(seconds_to_duration(1.0e30), Duration::MAX);
        assert_eq!(seconds_to_duration(f64::INFINITY), Duration::MAX);
    }

    #[test]
    fn test_patch_merges_without_replacing() {
        let prior = EntropySettings {
            latency: 2.0,
            error_rate: 0.3,
            throughput: 0.8,
        };
        let merged = EntropyPatch::single(EntropyKind::ErrorRate, 0.9).apply_to(prior);
        assert_eq!(merged.latency, 2.0);
        assert_eq!(merged.error_rate, 0.9);
        assert_eq!(merged.throughput, 0.8);
    }

    #[test]
    fn test_patch_is_idempotent() {
        let patch = EntropyPatch::single(EntropyKind::Latency, 1.5);
        let once = patch.apply_to(EntropySettings::baseline());
        let twice = patch.apply_to(once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_patch_from_fields() {
        let patch = EntropyPatch::from_fields([("errors", 0.5), ("latency", 1.0)]).unwrap();
        assert_eq!(patch.error_rate, Some(0.5));
        assert_eq!(patch.latency, Some(1.0));
        assert_eq!(
            patch.changes(),
            vec![(EntropyKind::Latency, 1.0), (EntropyKind::ErrorRate, 0.5)]
        );

        let err = EntropyPatch::from_fields([("memory", 1.0)]).unwrap_err();
        assert_eq!(err, UnknownEntropyKind("memory".to_string()));
    }

    #[test]
    fn test_settings_serde_shape() {
        let json = serde_json::to_value(EntropySettings::baseline()).unwrap();
        assert_eq!(json["latency"], 0.0);
        assert_eq!(json["error_rate"], 0.0);
        assert_eq!(json["throughput"], 1.0);

        let kind: EntropyKind = serde_json::from_str("\"errors\"").unwrap();
        assert_eq!(kind, EntropyKind::ErrorRate);
    }
}
