//! Experiment Engine - lifecycle and streaming statistics for two-arm
//! comparisons
//!
//! An experiment is created `running`, accumulates per-arm running
//! statistics from samples reported by the serving layer, and on an explicit
//! `end` freezes its statistics and declares a winner on the primary
//! decision metric (the FIRST entry of `tracked_metrics`). There is no
//! timeout: a running experiment stays open until `end` is called.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::record::{
    Arm, ExperimentRecord, ExperimentStatus, FinalResult, MetricComparison, Winner,
};
use super::stats::MetricSummary;
use crate::kv::KvStore;
use crate::registry::PctChange;
use crate::sync::{self, LockTable};
use crate::{keys, Error, RegistryConfig, Result};

/// Per-arm, per-metric view of an experiment's statistics.
///
/// For a completed experiment this is the frozen `final_result`; for a
/// running one it is computed from the current running statistics
/// (`comparisons` empty, `winner` absent).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentResults {
    /// Experiment id
    pub experiment_id: String,
    /// Experiment name
    pub name: String,
    /// Model type under comparison
    pub model_type: String,
    /// Arm A version id
    pub version_a: String,
    /// Arm B version id
    pub version_b: String,
    /// Current status
    pub status: ExperimentStatus,
    /// Start timestamp
    pub started_at: DateTime<Utc>,
    /// End timestamp, if completed
    pub ended_at: Option<DateTime<Utc>>,
    /// Samples reported against arm A
    pub samples_a: u64,
    /// Samples reported against arm B
    pub samples_b: u64,
    /// Arm A metric summaries (zero-count metrics omitted)
    pub version_a_metrics: BTreeMap<String, MetricSummary>,
    /// Arm B metric summaries (zero-count metrics omitted)
    pub version_b_metrics: BTreeMap<String, MetricSummary>,
    /// Cross-arm comparisons (empty while running)
    pub comparisons: BTreeMap<String, MetricComparison>,
    /// Declared winner (absent while running or when no winner)
    pub winner: Option<Winner>,
}

/// Lifecycle and statistics engine for two-arm experiments.
pub struct ExperimentEngine<K> {
    kv: Arc<K>,
    locks: Arc<LockTable>,
    config: RegistryConfig,
}

impl<K: KvStore> ExperimentEngine<K> {
    pub(crate) fn new(kv: Arc<K>, locks: Arc<LockTable>, config: RegistryConfig) -> Self {
        Self { kv, locks, config }
    }

    /// Create a new running experiment between two registered versions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] if either version is not
    /// registered under `model_type`, [`Error::Validation`] if
    /// `traffic_split` is outside `[0, 1]` (or not finite) or
    /// `tracked_metrics` is empty.
    pub async fn create(
        &self,
        name: &str,
        model_type: &str,
        version_a: &str,
        version_b: &str,
        traffic_split: f64,
        tracked_metrics: Vec<String>,
    ) -> Result<ExperimentRecord> {
        if !traffic_split.is_finite() || !(0.0..=1.0).contains(&traffic_split) {
            return Err(Error::Validation(format!(
                "traffic_split must be within [0, 1], got {traffic_split}"
            )));
        }
        if tracked_metrics.is_empty() {
            return Err(Error::Validation(
                "tracked_metrics must not be empty".to_string(),
            ));
        }
        for version_id in [version_a, version_b] {
            if !self
                .kv
                .exists(&keys::version(model_type, version_id))
                .await?
            {
                return Err(Error::VersionNotFound {
                    model_type: model_type.to_string(),
                    version_id: version_id.to_string(),
                });
            }
        }

        let mutex = self.locks.lock_for(sync::EXPERIMENT_ID_GEN);
        let _guard = mutex.lock().await;

        let experiment_id = self.fresh_experiment_id().await?;
        let record = ExperimentRecord::new(
            &experiment_id,
            name,
            model_type,
            version_a,
            version_b,
            traffic_split,
            tracked_metrics,
        );

        self.kv
            .put(
                &keys::experiment(&experiment_id),
                serde_json::to_vec(&record)?,
            )
            .await?;

        info!(experiment_id, name, model_type, "created experiment");
        Ok(record)
    }

    /// Get a raw experiment record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExperimentNotFound`] if absent.
    pub async fn get(&self, experiment_id: &str) -> Result<ExperimentRecord> {
        let bytes = self
            .kv
            .get(&keys::experiment(experiment_id))
            .await?
            .ok_or_else(|| Error::ExperimentNotFound(experiment_id.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// List experiments, optionally filtered by status, ordered by start
    /// time. Undecodable records are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the backend listing fails.
    pub async fn list(&self, status: Option<ExperimentStatus>) -> Result<Vec<ExperimentRecord>> {
        let pairs = self.kv.list_prefix(keys::ALL_EXPERIMENTS_PREFIX).await?;

        let mut records: Vec<ExperimentRecord> = pairs
            .into_iter()
            .filter_map(|(key, bytes)| match serde_json::from_slice(&bytes) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(key, error = %e, "skipping undecodable experiment record");
                    None
                }
            })
            .filter(|r: &ExperimentRecord| status.map_or(true, |s| r.status() == s))
            .collect();

        records.sort_by_key(ExperimentRecord::started_at);
        Ok(records)
    }

    /// Report metric samples for one arm of a running experiment.
    ///
    /// For each reported metric the running triple advances by
    /// `count += sample_count`, `sum += value * sample_count`,
    /// `sum_of_squares += value^2 * sample_count` — so one batched call is
    /// exactly equivalent to `sample_count` single-sample calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExperimentNotFound`], [`Error::ExperimentNotRunning`]
    /// if already completed, [`Error::VersionNotInExperiment`] if
    /// `version_id` is neither arm, or [`Error::Validation`] for a zero
    /// `sample_count` or non-finite values.
    pub async fn record(
        &self,
        experiment_id: &str,
        version_id: &str,
        metric_values: &BTreeMap<String, f64>,
        sample_count: u64,
    ) -> Result<()> {
        if sample_count == 0 {
            return Err(Error::Validation(
                "sample_count must be at least 1".to_string(),
            ));
        }
        if let Some((name, value)) = metric_values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::Validation(format!(
                "metric {name} has non-finite value {value}"
            )));
        }

        let mutex = self.locks.lock_for(&sync::experiment_key(experiment_id));
        let _guard = mutex.lock().await;

        let mut record = self.get(experiment_id).await?;
        if !record.is_running() {
            return Err(Error::ExperimentNotRunning(experiment_id.to_string()));
        }
        let arm = record
            .arm_of(version_id)
            .ok_or_else(|| Error::VersionNotInExperiment {
                experiment_id: experiment_id.to_string(),
                version_id: version_id.to_string(),
            })?;

        record.observe(arm, metric_values, sample_count);

        self.kv
            .put(
                &keys::experiment(experiment_id),
                serde_json::to_vec(&record)?,
            )
            .await?;
        Ok(())
    }

    /// Get per-arm, per-metric results.
    ///
    /// Completed experiments return their frozen `final_result`; running
    /// ones get an instantaneous computation over the current statistics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExperimentNotFound`] if absent.
    pub async fn results(&self, experiment_id: &str) -> Result<ExperimentResults> {
        let record = self.get(experiment_id).await?;
        Ok(build_results(&record))
    }

    /// End a running experiment: freeze statistics, compute comparisons,
    /// declare a winner on the primary decision metric.
    ///
    /// The winner threshold comes from the registry configuration (default
    /// 5%): `pct_change > +threshold` declares arm B, `< -threshold` declares
    /// arm A, anything else (including an undefined change over a zero
    /// baseline) declares no winner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExperimentNotFound`], or
    /// [`Error::ExperimentNotRunning`] if the experiment already completed.
    pub async fn end(&self, experiment_id: &str) -> Result<ExperimentResults> {
        let mutex = self.locks.lock_for(&sync::experiment_key(experiment_id));
        let _guard = mutex.lock().await;

        let mut record = self.get(experiment_id).await?;
        if !record.is_running() {
            return Err(Error::ExperimentNotRunning(experiment_id.to_string()));
        }

        let version_a = summarize_arm(&record, Arm::A);
        let version_b = summarize_arm(&record, Arm::B);

        // Comparisons cover every metric observed on both arms
        let comparisons: BTreeMap<String, MetricComparison> = version_a
            .iter()
            .filter_map(|(metric, a)| {
                version_b
                    .get(metric)
                    .map(|b| (metric.clone(), MetricComparison::new(a.mean, b.mean)))
            })
            .collect();

        let winner = decide_winner(
            record.tracked_metrics(),
            &comparisons,
            self.config.winner_threshold_pct,
        );

        record.complete(FinalResult {
            version_a,
            version_b,
            comparisons,
            winner,
        });

        self.kv
            .put(
                &keys::experiment(experiment_id),
                serde_json::to_vec(&record)?,
            )
            .await?;

        info!(experiment_id, ?winner, "ended experiment");
        Ok(build_results(&record))
    }

    /// Find an unused timestamp-derived experiment id.
    async fn fresh_experiment_id(&self) -> Result<String> {
        let base = format!("exp-{}", Utc::now().format("%Y%m%d%H%M%S"));
        let mut candidate = base.clone();
        let mut attempt: u32 = 0;

        while self.kv.exists(&keys::experiment(&candidate)).await? {
            attempt += 1;
            if attempt > self.config.id_retry_limit {
                return Err(Error::Validation(format!(
                    "unresolved experiment id collision after {attempt} attempts"
                )));
            }
            candidate = format!("{base}-{attempt}");
        }

        Ok(candidate)
    }
}

/// Summarize one arm's metrics, omitting zero-count entries.
fn summarize_arm(record: &ExperimentRecord, arm: Arm) -> BTreeMap<String, MetricSummary> {
    record
        .arm(arm)
        .metrics
        .iter()
        .filter_map(|(metric, stats)| stats.summary().map(|s| (metric.clone(), s)))
        .collect()
}

/// Apply the fixed-threshold decision rule on the primary metric.
///
/// The first tracked metric is the decision metric; this positional
/// convention is deliberate and documented on `ExperimentRecord`.
fn decide_winner(
    tracked_metrics: &[String],
    comparisons: &BTreeMap<String, MetricComparison>,
    threshold_pct: f64,
) -> Option<Winner> {
    let primary = tracked_metrics.first()?;
    let comparison = comparisons.get(primary)?;
    match comparison.pct_change {
        PctChange::Defined(pct) if pct > threshold_pct => Some(Winner::VersionB),
        PctChange::Defined(pct) if pct < -threshold_pct => Some(Winner::VersionA),
        // Below threshold, or undefined over a zero baseline: no winner
        PctChange::Defined(_) | PctChange::Undefined => None,
    }
}

/// Project a record into the results payload.
fn build_results(record: &ExperimentRecord) -> ExperimentResults {
    let (version_a_metrics, version_b_metrics, comparisons, winner) = match record.final_result() {
        Some(frozen) => (
            frozen.version_a.clone(),
            frozen.version_b.clone(),
            frozen.comparisons.clone(),
            frozen.winner,
        ),
        None => (
            summarize_arm(record, Arm::A),
            summarize_arm(record, Arm::B),
            BTreeMap::new(),
            None,
        ),
    };

    ExperimentResults {
        experiment_id: record.experiment_id().to_string(),
        name: record.name().to_string(),
        model_type: record.model_type().to_string(),
        version_a: record.version_a().to_string(),
        version_b: record.version_b().to_string(),
        status: record.status(),
        started_at: record.started_at(),
        ended_at: record.ended_at(),
        samples_a: record.arm(Arm::A).samples,
        samples_b: record.arm(Arm::B).samples,
        version_a_metrics,
        version_b_metrics,
        comparisons,
        winner,
    }
}
