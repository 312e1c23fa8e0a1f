//! Promotion Controller - apply an experiment's declared winner

use std::sync::Arc;
use tracing::info;

use super::record::ExperimentRecord;
use crate::kv::KvStore;
use crate::registry::ActiveSelector;
use crate::sync::LockTable;
use crate::{keys, Error, Result};

/// Applies a completed experiment's winner as the new active version.
pub struct PromotionController<K> {
    kv: Arc<K>,
    active: ActiveSelector<K>,
}

impl<K: KvStore> PromotionController<K> {
    pub(crate) fn new(kv: Arc<K>, locks: Arc<LockTable>) -> Self {
        let active = ActiveSelector::new(Arc::clone(&kv), locks);
        Self { kv, active }
    }

    /// Promote the winning arm of a completed experiment to active.
    ///
    /// Idempotent: promoting an already-promoted experiment re-applies the
    /// same pointer. Returns the promoted version id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExperimentNotFound`] if the experiment does not
    /// exist, [`Error::ExperimentNotCompleted`] if it is still running, or
    /// [`Error::NoWinnerDeclared`] if it ended without a winner.
    pub async fn promote(&self, experiment_id: &str) -> Result<String> {
        let bytes = self
            .kv
            .get(&keys::experiment(experiment_id))
            .await?
            .ok_or_else(|| Error::ExperimentNotFound(experiment_id.to_string()))?;
        let record: ExperimentRecord = serde_json::from_slice(&bytes)?;

        let final_result = record
            .final_result()
            .ok_or_else(|| Error::ExperimentNotCompleted(experiment_id.to_string()))?;
        let winner = final_result
            .winner
            .ok_or_else(|| Error::NoWinnerDeclared(experiment_id.to_string()))?;

        let version_id = record.winning_version(winner).to_string();
        self.active
            .set_active(record.model_type(), &version_id)
            .await?;

        info!(
            experiment_id,
            model_type = record.model_type(),
            version_id,
            "promoted experiment winner"
        );
        Ok(version_id)
    }
}
