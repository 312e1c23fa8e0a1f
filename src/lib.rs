//! # Ascender: Model Version Registry & Experimentation Engine
//!
//! Ascender tracks every trained model artifact under a logical model type,
//! decides which version currently serves traffic, and runs controlled
//! two-arm comparisons with streaming statistics before promoting a winner.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: the resolved active version can never be deleted;
//!   promotion requires a statistically declared winner
//! - **Jidoka**: every state transition is persisted whole-document, so
//!   readers always see a consistent snapshot
//! - **Genchi Genbutsu**: decisions come from observed per-arm statistics,
//!   not model internals — artifacts stay opaque
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ascender::kv::MemoryKvStore;
//! use ascender::Registry;
//! use std::collections::BTreeMap;
//!
//! # async fn example() -> ascender::Result<()> {
//! let registry = Registry::builder()
//!     .winner_threshold_pct(5.0)
//!     .build(MemoryKvStore::new());
//!
//! // Register a trained artifact (weights live in an external blob store)
//! let version = registry
//!     .versions()
//!     .register("similarity", "s3://models/sim/1", BTreeMap::new(), BTreeMap::new())
//!     .await?;
//!
//! // Newest version serves traffic until a pointer is set explicitly
//! let active = registry.active().get_active("similarity").await?;
//! assert_eq!(active.as_deref(), Some(version.version_id()));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod experiment;
mod keys;
pub mod kv;
pub mod registry;
mod sync;

pub use error::{Error, Result};

use experiment::{ExperimentEngine, PromotionController};
use kv::KvStore;
use registry::{ActiveSelector, VersionStore};
use std::sync::Arc;
use sync::LockTable;

/// Tunable parameters shared across the registry components.
#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    /// Percentage-change cutoff on the primary metric for declaring an
    /// experiment winner. Default 5.0 (i.e. ±5%).
    pub winner_threshold_pct: f64,
    /// Maximum retries when resolving a timestamp-derived id collision.
    pub id_retry_limit: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            winner_threshold_pct: 5.0,
            id_retry_limit: 16,
        }
    }
}

/// Registry instance bundling the four components over one shared backend:
/// version store, active-version selector, experiment engine, and promotion
/// controller.
pub struct Registry<K> {
    versions: VersionStore<K>,
    active: ActiveSelector<K>,
    experiments: ExperimentEngine<K>,
    promotion: PromotionController<K>,
}

impl Registry<()> {
    /// Create a new registry builder.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }
}

impl<K: KvStore> Registry<K> {
    /// The version store: register, list, get, delete, compare, history.
    #[must_use]
    pub const fn versions(&self) -> &VersionStore<K> {
        &self.versions
    }

    /// The active-version selector: get_active, set_active.
    #[must_use]
    pub const fn active(&self) -> &ActiveSelector<K> {
        &self.active
    }

    /// The experiment engine: create, record, results, end, list.
    #[must_use]
    pub const fn experiments(&self) -> &ExperimentEngine<K> {
        &self.experiments
    }

    /// The promotion controller: promote a declared winner.
    #[must_use]
    pub const fn promotion(&self) -> &PromotionController<K> {
        &self.promotion
    }
}

/// Registry builder
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryBuilder {
    config: RegistryConfig,
}

impl RegistryBuilder {
    /// Set the winner threshold (percent change on the primary metric).
    #[must_use]
    pub const fn winner_threshold_pct(mut self, pct: f64) -> Self {
        self.config.winner_threshold_pct = pct;
        self
    }

    /// Set the id-collision retry limit.
    #[must_use]
    pub const fn id_retry_limit(mut self, limit: u32) -> Self {
        self.config.id_retry_limit = limit;
        self
    }

    /// Build the registry over a persistence backend.
    ///
    /// All components share the backend and one per-key lock table, so
    /// mutations on the same model type or experiment serialize correctly
    /// across components.
    pub fn build<K: KvStore>(self, kv: K) -> Registry<K> {
        let config = self.config;
        let kv = Arc::new(kv);
        let locks = Arc::new(LockTable::new());

        Registry {
            versions: VersionStore::new(Arc::clone(&kv), Arc::clone(&locks), config),
            active: ActiveSelector::new(Arc::clone(&kv), Arc::clone(&locks)),
            experiments: ExperimentEngine::new(Arc::clone(&kv), Arc::clone(&locks), config),
            promotion: PromotionController::new(kv, locks),
        }
    }
}
