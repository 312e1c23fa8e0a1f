//! Key-family encoding for the persistence layer.
//!
//! Three key families share one `KvStore`:
//!
//! ```text
//! mv/{model_type}/{version_id}  -> ModelVersion JSON
//! seq/{model_type}              -> registration counter
//! active/{model_type}           -> active version_id (JSON string)
//! exp/{experiment_id}           -> ExperimentRecord JSON
//! ```
//!
//! `model_type` is validated to never contain `/`, so prefixes cannot
//! collide across model types.

/// Key for a single model version record.
pub(crate) fn version(model_type: &str, version_id: &str) -> String {
    format!("mv/{model_type}/{version_id}")
}

/// Prefix covering all versions of a model type.
pub(crate) fn version_prefix(model_type: &str) -> String {
    format!("mv/{model_type}/")
}

/// Prefix covering every version of every model type.
pub(crate) const ALL_VERSIONS_PREFIX: &str = "mv/";

/// Key for the per-model-type registration sequence counter.
pub(crate) fn seq(model_type: &str) -> String {
    format!("seq/{model_type}")
}

/// Key for the active-version pointer of a model type.
pub(crate) fn active(model_type: &str) -> String {
    format!("active/{model_type}")
}

/// Key for an experiment record.
pub(crate) fn experiment(experiment_id: &str) -> String {
    format!("exp/{experiment_id}")
}

/// Prefix covering all experiment records.
pub(crate) const ALL_EXPERIMENTS_PREFIX: &str = "exp/";
