//! Error types for ascender
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Ascender error types
#[derive(Error, Debug)]
pub enum Error {
    /// Requested version does not exist under the model type
    #[error("Version not found: {model_type}/{version_id}")]
    VersionNotFound {
        /// Model type the lookup was scoped to
        model_type: String,
        /// Version id that was not found
        version_id: String,
    },

    /// Model type has no registered versions
    #[error("Model type not found: {0}")]
    ModelTypeNotFound(String),

    /// Refused to delete the version currently serving traffic
    #[error("Cannot delete active version {model_type}/{version_id}\nSet a different active version first, then retry the delete")]
    ActiveVersionProtected {
        /// Model type owning the protected version
        model_type: String,
        /// The resolved active version id
        version_id: String,
    },

    /// Experiment id does not exist
    #[error("Experiment not found: {0}")]
    ExperimentNotFound(String),

    /// Operation requires a running experiment
    #[error("Experiment {0} is not running")]
    ExperimentNotRunning(String),

    /// Operation requires a completed experiment
    #[error("Experiment {0} is not completed")]
    ExperimentNotCompleted(String),

    /// Reported version is neither arm A nor arm B
    #[error("Version {version_id} is not part of experiment {experiment_id}")]
    VersionNotInExperiment {
        /// Experiment the sample was reported against
        experiment_id: String,
        /// The unrecognized version id
        version_id: String,
    },

    /// Experiment ended without a statistically meaningful winner
    #[error("Experiment {0} has no declared winner\nInspect the final comparisons and promote manually with set_active if desired")]
    NoWinnerDeclared(String),

    /// Invalid input (empty required field, bad ratio, unresolved id collision)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage backend unavailable or failed mid-operation
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Stored record could not be encoded/decoded
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
