//! Testing utilities: an in-memory backing store and fixture helpers.
//!
//! [`MemoryStore`] stands in for the versioned object store in tests and
//! doctests. It keeps folder listings in insertion order, which doubles
//! as the store's "native order" for merge-ordering assertions.

use crate::error::StoreError;
use crate::store::{ObjectStore, StoreEntry};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::SystemTime;

/// In-memory [`ObjectStore`] for tests.
///
/// Names compare case-insensitively, matching the protocols this overlay
/// is built for. Unknown parents list as empty.
#[derive(Debug, Default)]
pub struct MemoryStore {
    folders: DashMap<String, Vec<StoreEntry>>,
    fail_listings: bool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose listing calls all fail, for error-path tests.
    pub fn failing() -> Self {
        Self {
            folders: DashMap::new(),
            fail_listings: true,
        }
    }

    /// Adds a real file under `parent`.
    pub fn add_file(&self, parent: &str, name: &str, size: u64) {
        self.push(parent, store_file(parent, name, size));
    }

    /// Adds a real file carrying a version label.
    pub fn add_versioned_file(&self, parent: &str, name: &str, size: u64, version: &str) {
        let mut entry = store_file(parent, name, size);
        entry.version = Some(version.to_string());
        self.push(parent, entry);
    }

    /// Adds a real folder under `parent`.
    pub fn add_folder(&self, parent: &str, name: &str) {
        let mut entry = store_file(parent, name, 0);
        entry.directory = true;
        self.push(parent, entry);
    }

    fn push(&self, parent: &str, entry: StoreEntry) {
        self.folders
            .entry(parent.to_lowercase())
            .or_default()
            .push(entry);
    }
}

/// Builds a [`StoreEntry`] for a real file, with an id derived the same
/// way a store would derive one: from its own path namespace.
pub fn store_file(parent: &str, name: &str, size: u64) -> StoreEntry {
    let id = u64::from(crc32fast::hash(
        format!("{parent}/{name}").to_lowercase().as_bytes(),
    ));
    StoreEntry {
        name: name.to_string(),
        size,
        directory: false,
        modified: SystemTime::now(),
        version: None,
        id,
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_real(&self, parent: &str) -> Result<Vec<StoreEntry>, StoreError> {
        if self.fail_listings {
            return Err(StoreError::Backend("store offline".to_string()));
        }
        Ok(self
            .folders
            .get(&parent.to_lowercase())
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }

    async fn get_real(
        &self,
        parent: &str,
        name: &str,
    ) -> Result<Option<StoreEntry>, StoreError> {
        if self.fail_listings {
            return Err(StoreError::Backend("store offline".to_string()));
        }
        Ok(self
            .folders
            .get(&parent.to_lowercase())
            .and_then(|entries| {
                entries
                    .iter()
                    .find(|e| e.name.eq_ignore_ascii_case(name))
                    .cloned()
            }))
    }
}
