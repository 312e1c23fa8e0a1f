//! Version Store - durable catalog of model artifacts per model type
//!
//! **Append-Only Write Pattern**: registration appends a new immutable
//! record; there are no in-place updates. Changing metrics or tags means
//! registering a new version. The only destructive operation is an explicit
//! `delete`, which refuses to remove the resolved active version.
//!
//! Ordering is maintained by a persisted `(created_at, seq)` key per record
//! instead of re-sorting a global map on every load; `seq` is a per-model-type
//! counter incremented under the model-type lock.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::kv::KvStore;
use crate::registry::active::resolve_active;
use crate::registry::compare::{HistoryPoint, MetricDelta, VersionComparison};
use crate::registry::version::ModelVersion;
use crate::sync::{self, LockTable};
use crate::{keys, Error, RegistryConfig, Result};

/// Durable catalog of model versions over a `KvStore` backend.
pub struct VersionStore<K> {
    kv: Arc<K>,
    locks: Arc<LockTable>,
    config: RegistryConfig,
}

impl<K: KvStore> VersionStore<K> {
    pub(crate) fn new(kv: Arc<K>, locks: Arc<LockTable>, config: RegistryConfig) -> Self {
        Self { kv, locks, config }
    }

    /// Register a new model version.
    ///
    /// Generates a fresh timestamp-derived `version_id` (collisions within
    /// the model type are resolved by retrying with a `-N` suffix) and
    /// persists the record with `created_at = now`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `model_type` is empty or contains
    /// `/`, if `artifact_reference` is empty, if any metric value is
    /// non-finite, or if the id collision cannot be resolved within the
    /// configured retry limit. Returns [`Error::Persistence`] /
    /// [`Error::Codec`] on backend failures.
    pub async fn register(
        &self,
        model_type: &str,
        artifact_reference: &str,
        tags: BTreeMap<String, String>,
        metrics: BTreeMap<String, f64>,
    ) -> Result<ModelVersion> {
        validate_model_type(model_type)?;
        if artifact_reference.is_empty() {
            return Err(Error::Validation(
                "artifact_reference must not be empty".to_string(),
            ));
        }
        if let Some((name, value)) = metrics.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::Validation(format!(
                "metric {name} has non-finite value {value}"
            )));
        }

        let mutex = self.locks.lock_for(&sync::model_type_key(model_type));
        let _guard = mutex.lock().await;

        let created_at = Utc::now();
        let version_id = self.fresh_version_id(model_type, created_at).await?;
        let seq = self.next_seq(model_type).await?;

        let version = ModelVersion::builder(model_type, &version_id, artifact_reference)
            .created_at(created_at)
            .seq(seq)
            .tags(tags)
            .metrics(metrics)
            .build();

        let key = keys::version(model_type, &version_id);
        self.kv.put(&key, serde_json::to_vec(&version)?).await?;

        info!(model_type, version_id, "registered model version");
        Ok(version)
    }

    /// List versions, newest first.
    ///
    /// With `model_type = Some(..)` lists that type only; with `None` lists
    /// every type. Ties on `created_at` are broken by registration order.
    /// Stored records that fail to decode are skipped with a warning rather
    /// than failing the whole listing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the backend listing fails.
    pub async fn list(&self, model_type: Option<&str>) -> Result<Vec<ModelVersion>> {
        let prefix = match model_type {
            Some(mt) => keys::version_prefix(mt),
            None => keys::ALL_VERSIONS_PREFIX.to_string(),
        };

        let mut versions = decode_versions(self.kv.list_prefix(&prefix).await?);
        versions.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
        Ok(versions)
    }

    /// Get a single version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] if absent, [`Error::Codec`] if the
    /// stored record cannot be decoded.
    pub async fn get(&self, model_type: &str, version_id: &str) -> Result<ModelVersion> {
        let key = keys::version(model_type, version_id);
        let bytes = self
            .kv
            .get(&key)
            .await?
            .ok_or_else(|| Error::VersionNotFound {
                model_type: model_type.to_string(),
                version_id: version_id.to_string(),
            })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Delete a version permanently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] if the version does not exist, or
    /// [`Error::ActiveVersionProtected`] if it is the currently resolved
    /// active version for the model type (explicit pointer or
    /// newest-by-default). The store is left unchanged on failure.
    pub async fn delete(&self, model_type: &str, version_id: &str) -> Result<()> {
        let mutex = self.locks.lock_for(&sync::model_type_key(model_type));
        let _guard = mutex.lock().await;

        // Existence check before the protection check, so deleting an
        // unknown version reports VersionNotFound.
        self.get(model_type, version_id).await?;

        if resolve_active(self.kv.as_ref(), model_type).await?.as_deref() == Some(version_id) {
            return Err(Error::ActiveVersionProtected {
                model_type: model_type.to_string(),
                version_id: version_id.to_string(),
            });
        }

        self.kv.delete(&keys::version(model_type, version_id)).await?;
        info!(model_type, version_id, "deleted model version");
        Ok(())
    }

    /// Compare the metrics of two versions of the same model type.
    ///
    /// Covers every metric present on both versions. A zero baseline yields
    /// the `PctChange::Undefined` sentinel instead of an infinity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] if either version is absent.
    pub async fn compare(
        &self,
        model_type: &str,
        version_id_1: &str,
        version_id_2: &str,
    ) -> Result<VersionComparison> {
        let v1 = self.get(model_type, version_id_1).await?;
        let v2 = self.get(model_type, version_id_2).await?;

        let differences: BTreeMap<String, MetricDelta> = v1
            .metrics()
            .iter()
            .filter_map(|(name, value_1)| {
                v2.metrics()
                    .get(name)
                    .map(|value_2| (name.clone(), MetricDelta::new(*value_1, *value_2)))
            })
            .collect();

        Ok(VersionComparison {
            model_type: model_type.to_string(),
            version_1: version_id_1.to_string(),
            version_2: version_id_2.to_string(),
            differences,
        })
    }

    /// Chronological performance history for a model type.
    ///
    /// Oldest first; versions without reported metrics are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the backend listing fails.
    pub async fn history(&self, model_type: &str) -> Result<Vec<HistoryPoint>> {
        let mut versions = self.list(Some(model_type)).await?;
        versions.reverse();

        Ok(versions
            .into_iter()
            .filter(|v| !v.metrics().is_empty())
            .map(|v| HistoryPoint {
                version_id: v.version_id().to_string(),
                created_at: v.created_at(),
                metrics: v.metrics().clone(),
            })
            .collect())
    }

    /// Find an unused timestamp-derived version id.
    ///
    /// Retries with a `-N` suffix on collision; bails out after the
    /// configured attempt limit so a stuck clock cannot loop forever.
    async fn fresh_version_id(
        &self,
        model_type: &str,
        created_at: chrono::DateTime<Utc>,
    ) -> Result<String> {
        let base = format!("v{}", created_at.format("%Y%m%d%H%M%S"));
        let mut candidate = base.clone();
        let mut attempt: u32 = 0;

        while self
            .kv
            .exists(&keys::version(model_type, &candidate))
            .await?
        {
            attempt += 1;
            if attempt > self.config.id_retry_limit {
                return Err(Error::Validation(format!(
                    "unresolved version id collision for {model_type} after {attempt} attempts"
                )));
            }
            candidate = format!("{base}-{attempt}");
        }

        Ok(candidate)
    }

    /// Advance and persist the per-model-type registration counter.
    async fn next_seq(&self, model_type: &str) -> Result<u64> {
        let key = keys::seq(model_type);
        let current: u64 = match self.kv.get(&key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => 0,
        };
        let next = current + 1;
        self.kv.put(&key, serde_json::to_vec(&next)?).await?;
        Ok(next)
    }
}

/// Validate a model type string used in key paths.
pub(crate) fn validate_model_type(model_type: &str) -> Result<()> {
    if model_type.is_empty() {
        return Err(Error::Validation("model_type must not be empty".to_string()));
    }
    if model_type.contains('/') {
        return Err(Error::Validation(format!(
            "model_type must not contain '/': {model_type}"
        )));
    }
    Ok(())
}

/// Decode listed version records, skipping undecodable entries.
///
/// Read-path safe default: a corrupt record degrades the listing, it does
/// not fail it. The anomaly is logged.
fn decode_versions(pairs: Vec<(String, Vec<u8>)>) -> Vec<ModelVersion> {
    pairs
        .into_iter()
        .filter_map(|(key, bytes)| match serde_json::from_slice(&bytes) {
            Ok(version) => Some(version),
            Err(e) => {
                warn!(key, error = %e, "skipping undecodable version record");
                None
            }
        })
        .collect()
}

/// Load all versions of a model type, newest first.
///
/// Shared with the active-version selector for the newest-by-default rule.
pub(crate) async fn load_versions_sorted<K: KvStore>(
    kv: &K,
    model_type: &str,
) -> Result<Vec<ModelVersion>> {
    let pairs = kv.list_prefix(&keys::version_prefix(model_type)).await?;
    let mut versions = decode_versions(pairs);
    versions.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_model_type_empty() {
        assert!(matches!(
            validate_model_type(""),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_model_type_slash() {
        assert!(matches!(
            validate_model_type("sim/nested"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_model_type_ok() {
        assert!(validate_model_type("similarity").is_ok());
    }

    #[test]
    fn test_decode_versions_skips_corrupt_records() {
        let good = ModelVersion::builder("sim", "v1", "blob://a").build();
        let pairs = vec![
            ("mv/sim/v1".to_string(), serde_json::to_vec(&good).unwrap()),
            ("mv/sim/v2".to_string(), b"not json".to_vec()),
        ];

        let versions = decode_versions(pairs);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version_id(), "v1");
    }
}
