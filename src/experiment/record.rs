//! Experiment Record - two-arm comparison between registered versions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::stats::{MetricSummary, RunningStats};
use crate::registry::PctChange;

/// Status of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    /// Experiment is accepting samples. Stays open indefinitely until an
    /// explicit `end`; there is no timeout.
    Running,
    /// Experiment has ended; statistics and result are frozen.
    Completed,
}

/// One of the two experiment arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arm {
    /// The baseline arm (`version_a`)
    A,
    /// The candidate arm (`version_b`)
    B,
}

/// The arm declared winner when an experiment ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    /// Arm A won (candidate regressed past the threshold)
    #[serde(rename = "version_a")]
    VersionA,
    /// Arm B won (candidate improved past the threshold)
    #[serde(rename = "version_b")]
    VersionB,
}

/// Running statistics for one arm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArmStats {
    /// Total samples reported against this arm
    pub samples: u64,
    /// Per-metric running aggregates
    pub metrics: BTreeMap<String, RunningStats>,
}

/// Comparison of one metric across both arms, computed at `end`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricComparison {
    /// Mean on arm A
    pub mean_a: f64,
    /// Mean on arm B
    pub mean_b: f64,
    /// `mean_b - mean_a`
    pub diff: f64,
    /// Relative change of B against A (`Undefined` when `mean_a == 0`)
    pub pct_change: PctChange,
}

impl MetricComparison {
    /// Build the comparison from the two arm means.
    #[must_use]
    pub fn new(mean_a: f64, mean_b: f64) -> Self {
        Self {
            mean_a,
            mean_b,
            diff: mean_b - mean_a,
            pct_change: PctChange::compute(mean_a, mean_b),
        }
    }
}

/// Frozen outcome of a completed experiment. Immutable once set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalResult {
    /// Per-metric summaries for arm A (zero-count metrics omitted)
    pub version_a: BTreeMap<String, MetricSummary>,
    /// Per-metric summaries for arm B (zero-count metrics omitted)
    pub version_b: BTreeMap<String, MetricSummary>,
    /// Cross-arm comparisons for metrics observed on both arms
    pub comparisons: BTreeMap<String, MetricComparison>,
    /// Declared winner, if the primary metric moved past the threshold
    pub winner: Option<Winner>,
}

/// Experiment Record tracks a two-arm comparison between two registered
/// versions of one model type.
///
/// The order of `tracked_metrics` is semantically load-bearing: the FIRST
/// entry is the primary decision metric used to declare a winner at `end`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentRecord {
    experiment_id: String,
    name: String,
    model_type: String,
    version_a: String,
    version_b: String,
    traffic_split: f64,
    tracked_metrics: Vec<String>,
    status: ExperimentStatus,
    arm_a: ArmStats,
    arm_b: ArmStats,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    final_result: Option<FinalResult>,
}

impl ExperimentRecord {
    /// Create a new running experiment with zeroed statistics for every
    /// tracked metric on both arms.
    ///
    /// Input validation (versions exist, split in range, metrics non-empty)
    /// belongs to the engine; this constructor only shapes the record.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        model_type: impl Into<String>,
        version_a: impl Into<String>,
        version_b: impl Into<String>,
        traffic_split: f64,
        tracked_metrics: Vec<String>,
    ) -> Self {
        let zeroed: BTreeMap<String, RunningStats> = tracked_metrics
            .iter()
            .map(|m| (m.clone(), RunningStats::new()))
            .collect();

        Self {
            experiment_id: experiment_id.into(),
            name: name.into(),
            model_type: model_type.into(),
            version_a: version_a.into(),
            version_b: version_b.into(),
            traffic_split,
            tracked_metrics,
            status: ExperimentStatus::Running,
            arm_a: ArmStats {
                samples: 0,
                metrics: zeroed.clone(),
            },
            arm_b: ArmStats {
                samples: 0,
                metrics: zeroed,
            },
            started_at: Utc::now(),
            ended_at: None,
            final_result: None,
        }
    }

    /// Get the experiment id.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the model type both arms belong to.
    #[must_use]
    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    /// Get the arm A version id.
    #[must_use]
    pub fn version_a(&self) -> &str {
        &self.version_a
    }

    /// Get the arm B version id.
    #[must_use]
    pub fn version_b(&self) -> &str {
        &self.version_b
    }

    /// Get the stored traffic split (enforcement is the serving layer's job).
    #[must_use]
    pub const fn traffic_split(&self) -> f64 {
        self.traffic_split
    }

    /// Get the tracked metrics; the first entry is the decision metric.
    #[must_use]
    pub fn tracked_metrics(&self) -> &[String] {
        &self.tracked_metrics
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> ExperimentStatus {
        self.status
    }

    /// Check whether the experiment is still accepting samples.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == ExperimentStatus::Running
    }

    /// Get the start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Get the end timestamp, if the experiment has completed.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Get the frozen result, if the experiment has completed.
    #[must_use]
    pub const fn final_result(&self) -> Option<&FinalResult> {
        self.final_result.as_ref()
    }

    /// Get the running statistics for an arm.
    #[must_use]
    pub const fn arm(&self, arm: Arm) -> &ArmStats {
        match arm {
            Arm::A => &self.arm_a,
            Arm::B => &self.arm_b,
        }
    }

    /// Map a version id onto its arm, if it participates in the experiment.
    #[must_use]
    pub fn arm_of(&self, version_id: &str) -> Option<Arm> {
        if version_id == self.version_a {
            Some(Arm::A)
        } else if version_id == self.version_b {
            Some(Arm::B)
        } else {
            None
        }
    }

    /// Resolve a winner to its version id.
    #[must_use]
    pub fn winning_version(&self, winner: Winner) -> &str {
        match winner {
            Winner::VersionA => &self.version_a,
            Winner::VersionB => &self.version_b,
        }
    }

    /// Fold a batch of metric values into an arm's running statistics.
    ///
    /// Metrics not present yet (reported but untracked) are initialized
    /// lazily; only tracked metrics carry decision semantics.
    pub(crate) fn observe(&mut self, arm: Arm, values: &BTreeMap<String, f64>, samples: u64) {
        let stats = match arm {
            Arm::A => &mut self.arm_a,
            Arm::B => &mut self.arm_b,
        };
        stats.samples += samples;
        for (metric, value) in values {
            stats
                .metrics
                .entry(metric.clone())
                .or_default()
                .observe(*value, samples);
        }
    }

    /// Freeze the experiment with its final result.
    pub(crate) fn complete(&mut self, final_result: FinalResult) {
        self.status = ExperimentStatus::Completed;
        self.ended_at = Some(Utc::now());
        self.final_result = Some(final_result);
    }
}
