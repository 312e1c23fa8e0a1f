//! Model Version Registry
//!
//! Durable catalog of model artifacts per model type plus the active-version
//! pointer that decides which version serves traffic.
//!
//! ```text
//! VersionStore (append-only records)
//!      │
//!      └── ActiveSelector (explicit pointer, else newest-by-creation)
//! ```
//!
//! Artifacts themselves live in an external blob store; the registry only
//! keeps the `artifact_reference` string and a metrics summary supplied by
//! the training pipeline.

mod active;
mod compare;
mod store;
mod version;

pub use active::ActiveSelector;
pub use compare::{HistoryPoint, MetricDelta, PctChange, VersionComparison};
pub use store::VersionStore;
pub use version::{ModelVersion, ModelVersionBuilder};
