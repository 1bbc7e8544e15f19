//! Interface to the backing versioned object store.
//!
//! The store supplies the real directory entries the overlay merges with
//! its synthetic ones. The overlay only ever reads through this interface;
//! nothing here can mutate the store.

use crate::error::StoreError;
use async_trait::async_trait;
use std::time::SystemTime;

/// A real entry supplied by the backing store.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// Entry name as the store spells it.
    pub name: String,
    /// Content size in bytes; 0 for folders.
    pub size: u64,
    /// Whether the entry is a folder.
    pub directory: bool,
    /// Last modification time reported by the store.
    pub modified: SystemTime,
    /// Version label, when the store tracks this entry's history.
    pub version: Option<String>,
    /// The store's own identifier for the entry.
    pub id: u64,
}

/// Read-only view of the backing versioned object store.
///
/// Implementations supply entries in their native listing order; the
/// overlay preserves that order when merging. Unknown parent paths list
/// as empty rather than erroring, keeping [`StoreError`] for genuine I/O
/// faults.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists the real entries directly under `parent`.
    async fn list_real(&self, parent: &str) -> Result<Vec<StoreEntry>, StoreError>;

    /// Looks up a single real entry by name under `parent`.
    async fn get_real(&self, parent: &str, name: &str)
        -> Result<Option<StoreEntry>, StoreError>;
}
