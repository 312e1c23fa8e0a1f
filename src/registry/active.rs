//! Active Version Selector - which version serves traffic for a model type
//!
//! Resolution order: explicit pointer first, newest registered version
//! otherwise. The pointer is a single small document per model type, so
//! promotion is one atomic overwrite.

use std::sync::Arc;
use tracing::info;

use crate::kv::KvStore;
use crate::registry::store::{load_versions_sorted, validate_model_type};
use crate::sync::{self, LockTable};
use crate::{keys, Error, Result};

/// Resolves and persists the active version per model type.
pub struct ActiveSelector<K> {
    kv: Arc<K>,
    locks: Arc<LockTable>,
}

impl<K: KvStore> ActiveSelector<K> {
    pub(crate) fn new(kv: Arc<K>, locks: Arc<LockTable>) -> Self {
        Self { kv, locks }
    }

    /// Resolve the active version id for a model type.
    ///
    /// Returns the explicit pointer if one is set, otherwise the newest
    /// version by `(created_at, seq)`, or `None` when the model type has no
    /// versions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] / [`Error::Codec`] on backend failures.
    pub async fn get_active(&self, model_type: &str) -> Result<Option<String>> {
        resolve_active(self.kv.as_ref(), model_type).await
    }

    /// Persist the active-version pointer for a model type. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelTypeNotFound`] when the model type has no
    /// registered versions, [`Error::VersionNotFound`] when `version_id`
    /// does not exist under it.
    pub async fn set_active(&self, model_type: &str, version_id: &str) -> Result<()> {
        validate_model_type(model_type)?;

        let mutex = self.locks.lock_for(&sync::model_type_key(model_type));
        let _guard = mutex.lock().await;

        if !self
            .kv
            .exists(&keys::version(model_type, version_id))
            .await?
        {
            let any = self
                .kv
                .list_prefix(&keys::version_prefix(model_type))
                .await?;
            if any.is_empty() {
                return Err(Error::ModelTypeNotFound(model_type.to_string()));
            }
            return Err(Error::VersionNotFound {
                model_type: model_type.to_string(),
                version_id: version_id.to_string(),
            });
        }

        self.kv
            .put(
                &keys::active(model_type),
                serde_json::to_vec(&version_id)?,
            )
            .await?;

        info!(model_type, version_id, "set active version");
        Ok(())
    }
}

/// Pointer-then-newest resolution, shared with the version store's
/// delete protection.
pub(crate) async fn resolve_active<K: KvStore>(
    kv: &K,
    model_type: &str,
) -> Result<Option<String>> {
    if let Some(bytes) = kv.get(&keys::active(model_type)).await? {
        let version_id: String = serde_json::from_slice(&bytes)?;
        return Ok(Some(version_id));
    }

    let versions = load_versions_sorted(kv, model_type).await?;
    Ok(versions.first().map(|v| v.version_id().to_string()))
}
