//! Comparison payloads for version metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Percentage change between two metric values.
///
/// When the baseline value is zero the change is `Undefined` rather than an
/// IEEE infinity: JSON cannot represent `inf`, and downstream consumers need
/// the payload to round-trip. `Undefined` serializes as `null`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PctChange {
    /// Baseline was nonzero; change expressed as a percentage of it.
    Defined(f64),
    /// Baseline was zero; percentage change has no meaning.
    Undefined,
}

impl PctChange {
    /// Compute the percentage change from `baseline` to `value`.
    #[must_use]
    pub fn compute(baseline: f64, value: f64) -> Self {
        if baseline == 0.0 {
            Self::Undefined
        } else {
            Self::Defined((value - baseline) / baseline * 100.0)
        }
    }

    /// Get the numeric change, if defined.
    #[must_use]
    pub const fn as_f64(self) -> Option<f64> {
        match self {
            Self::Defined(pct) => Some(pct),
            Self::Undefined => None,
        }
    }

    /// Check whether the change is the undefined sentinel.
    #[must_use]
    pub const fn is_undefined(self) -> bool {
        matches!(self, Self::Undefined)
    }
}

/// Per-metric delta between two versions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricDelta {
    /// Metric value on the first (baseline) version
    pub value_1: f64,
    /// Metric value on the second version
    pub value_2: f64,
    /// `value_2 - value_1`
    pub diff: f64,
    /// Relative change against the baseline
    pub pct_change: PctChange,
}

impl MetricDelta {
    /// Build the delta for one metric present on both versions.
    #[must_use]
    pub fn new(value_1: f64, value_2: f64) -> Self {
        Self {
            value_1,
            value_2,
            diff: value_2 - value_1,
            pct_change: PctChange::compute(value_1, value_2),
        }
    }
}

/// Result of comparing two versions of the same model type.
///
/// Covers the intersection of the two versions' metric sets; metrics
/// reported on only one side are omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionComparison {
    /// Model type both versions belong to
    pub model_type: String,
    /// Baseline version id
    pub version_1: String,
    /// Candidate version id
    pub version_2: String,
    /// Per-metric deltas, keyed by metric name
    pub differences: BTreeMap<String, MetricDelta>,
}

/// One point in a model type's performance history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryPoint {
    /// Version id this point belongs to
    pub version_id: String,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
    /// Metrics reported for the version
    pub metrics: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_change_defined() {
        let pct = PctChange::compute(0.70, 0.78);
        let value = pct.as_f64().unwrap();
        assert!((value - 11.428_571_428_571_429).abs() < 1e-9);
        assert!(!pct.is_undefined());
    }

    #[test]
    fn test_pct_change_zero_baseline_is_undefined() {
        let pct = PctChange::compute(0.0, 0.5);
        assert!(pct.is_undefined());
        assert_eq!(pct.as_f64(), None);
    }

    #[test]
    fn test_pct_change_undefined_serializes_as_null() {
        let json = serde_json::to_string(&PctChange::Undefined).unwrap();
        assert_eq!(json, "null");

        let back: PctChange = serde_json::from_str("null").unwrap();
        assert!(back.is_undefined());
    }

    #[test]
    fn test_metric_delta() {
        let delta = MetricDelta::new(0.5, 0.6);
        assert!((delta.diff - 0.1).abs() < 1e-12);
        assert!((delta.pct_change.as_f64().unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_version_comparison_round_trip() {
        let mut differences = BTreeMap::new();
        differences.insert("accuracy".to_string(), MetricDelta::new(0.0, 0.9));

        let comparison = VersionComparison {
            model_type: "sim".to_string(),
            version_1: "v1".to_string(),
            version_2: "v2".to_string(),
            differences,
        };

        let json = serde_json::to_string(&comparison).expect("serialization failed");
        assert!(!json.contains("inf"));

        let back: VersionComparison = serde_json::from_str(&json).expect("deserialization failed");
        assert!(back.differences["accuracy"].pct_change.is_undefined());
    }
}
