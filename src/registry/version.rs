//! Model Version Record - one registered artifact under a model type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Model Version represents a single registered model artifact.
///
/// Identified by `(model_type, version_id)`. The `artifact_reference` points
/// into an external blob store and is never interpreted here. `version_id`
/// and `created_at` are immutable once registered; updated metrics or tags
/// require registering a new version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelVersion {
    model_type: String,
    version_id: String,
    artifact_reference: String,
    created_at: DateTime<Utc>,
    seq: u64,
    tags: BTreeMap<String, String>,
    metrics: BTreeMap<String, f64>,
}

impl ModelVersion {
    /// Create a builder for constructing a version record.
    ///
    /// Used by the version store during registration; `seq` and timestamps
    /// are assigned there.
    #[must_use]
    pub fn builder(
        model_type: impl Into<String>,
        version_id: impl Into<String>,
        artifact_reference: impl Into<String>,
    ) -> ModelVersionBuilder {
        ModelVersionBuilder::new(model_type, version_id, artifact_reference)
    }

    /// Get the model type.
    #[must_use]
    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    /// Get the version id.
    #[must_use]
    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    /// Get the opaque artifact reference.
    #[must_use]
    pub fn artifact_reference(&self) -> &str {
        &self.artifact_reference
    }

    /// Get the registration timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the per-model-type registration sequence number.
    ///
    /// Breaks `created_at` ties when ordering versions newest-first.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Get the free-form tags.
    #[must_use]
    pub const fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Get the reported metrics (may be empty until training reports them).
    #[must_use]
    pub const fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    /// Ordering key for newest-first listings: `(created_at, seq)` descending.
    pub(crate) const fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.seq)
    }
}

/// Builder for `ModelVersion`.
#[derive(Debug)]
pub struct ModelVersionBuilder {
    model_type: String,
    version_id: String,
    artifact_reference: String,
    created_at: DateTime<Utc>,
    seq: u64,
    tags: BTreeMap<String, String>,
    metrics: BTreeMap<String, f64>,
}

impl ModelVersionBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        model_type: impl Into<String>,
        version_id: impl Into<String>,
        artifact_reference: impl Into<String>,
    ) -> Self {
        Self {
            model_type: model_type.into(),
            version_id: version_id.into(),
            artifact_reference: artifact_reference.into(),
            created_at: Utc::now(),
            seq: 0,
            tags: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the registration sequence number.
    #[must_use]
    pub const fn seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    /// Set the tags mapping.
    #[must_use]
    pub fn tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the metrics mapping.
    #[must_use]
    pub fn metrics(mut self, metrics: BTreeMap<String, f64>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Build the `ModelVersion`.
    #[must_use]
    pub fn build(self) -> ModelVersion {
        ModelVersion {
            model_type: self.model_type,
            version_id: self.version_id,
            artifact_reference: self.artifact_reference,
            created_at: self.created_at,
            seq: self.seq,
            tags: self.tags,
            metrics: self.metrics,
        }
    }
}
