//! Key-Value Persistence Module
//!
//! Registry and experiment state is persisted through this interface so the
//! core logic is testable without real storage. Backends provide:
//! - `get` / `put` / `delete` / `exists` over opaque byte values
//! - `list_prefix` for the per-model-type and per-experiment key families
//! - An async-first API compatible with pforge `StateManager`
//!
//! # Example
//!
//! ```rust,no_run
//! use ascender::kv::{KvStore, MemoryKvStore};
//!
//! # async fn example() -> ascender::Result<()> {
//! let store = MemoryKvStore::new();
//!
//! // Basic operations
//! store.put("key", b"value".to_vec()).await?;
//! let value = store.get("key").await?;
//! assert_eq!(value, Some(b"value".to_vec()));
//!
//! store.delete("key").await?;
//! assert!(!store.exists("key").await?);
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::MemoryKvStore;

use crate::Result;
use std::future::Future;

/// Key-value store trait for registry persistence.
///
/// One persistence round-trip per operation; no operation suspends for
/// unbounded periods. Implementations must be safe for concurrent use.
pub trait KvStore: Send + Sync {
    /// Get a value by key.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Put a value for a key.
    ///
    /// Overwrites any existing value.
    fn put(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Delete a key.
    ///
    /// No-op if the key doesn't exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// List all `(key, value)` pairs whose key starts with `prefix`,
    /// ordered by key.
    fn list_prefix(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<(String, Vec<u8>)>>> + Send;
}
