//! The overlay registry: per-folder authority for synthetic entries.
//!
//! The registry decides which pseudo entries exist under a given parent
//! path and how they compose with the backing store's real entries. Real
//! entries always shadow synthetic ones of the same name, so the backing
//! store can later create an object with a colliding name without the
//! overlay presenting two identities for it.
//!
//! # Concurrency
//!
//! Each parent's entry set lives in an immutable [`FolderContext`]
//! snapshot behind an `Arc`. Mutations build a new snapshot and swap it
//! under the owning dashmap shard lock; readers clone the `Arc` and
//! traverse the old or new set, never a partially updated one.
//! Registrations under unrelated parents proceed independently.

use crate::config::OverlayConfig;
use crate::entry::PseudoEntry;
use crate::error::{OverlayError, OverlayResult};
use crate::handle::PseudoHandle;
use crate::path::PathResolver;
use crate::stats::OverlayStats;
use crate::store::{ObjectStore, StoreEntry};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Immutable snapshot of the synthetic entries under one parent.
#[derive(Debug)]
struct FolderContext {
    /// Normalized parent path in its registered spelling.
    parent: String,
    /// Entries in registration order.
    entries: Vec<Arc<PseudoEntry>>,
}

/// One entry in a merged directory view.
#[derive(Debug, Clone)]
pub enum OverlayEntry {
    /// A real entry owned by the backing store.
    Real(StoreEntry),
    /// A synthetic entry owned by the registry.
    Pseudo(Arc<PseudoEntry>),
}

impl OverlayEntry {
    /// Entry name.
    pub fn name(&self) -> &str {
        match self {
            OverlayEntry::Real(e) => &e.name,
            OverlayEntry::Pseudo(e) => e.name(),
        }
    }

    /// Content size in bytes; 0 for folders.
    pub fn size(&self) -> u64 {
        match self {
            OverlayEntry::Real(e) => e.size,
            OverlayEntry::Pseudo(e) => e.descriptor().size(),
        }
    }

    /// Whether the entry is a folder.
    pub fn is_folder(&self) -> bool {
        match self {
            OverlayEntry::Real(e) => e.directory,
            OverlayEntry::Pseudo(e) => e.is_folder(),
        }
    }

    /// Whether the entry is synthetic.
    pub fn is_pseudo(&self) -> bool {
        matches!(self, OverlayEntry::Pseudo(_))
    }

    /// The synthetic entry, if this is one.
    pub fn pseudo(&self) -> Option<&Arc<PseudoEntry>> {
        match self {
            OverlayEntry::Pseudo(e) => Some(e),
            OverlayEntry::Real(_) => None,
        }
    }

    /// The real store entry, if this is one.
    pub fn real(&self) -> Option<&StoreEntry> {
        match self {
            OverlayEntry::Real(e) => Some(e),
            OverlayEntry::Pseudo(_) => None,
        }
    }
}

/// Per-parent registry of synthetic entries, merged on demand with the
/// backing store's real listings.
pub struct OverlayRegistry {
    store: Arc<dyn ObjectStore>,
    resolver: PathResolver,
    contexts: DashMap<String, Arc<FolderContext>>,
    stats: Arc<OverlayStats>,
}

impl OverlayRegistry {
    /// Creates a registry over `store` with the default configuration.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_config(store, &OverlayConfig::default())
    }

    /// Creates a registry over `store` with an explicit configuration.
    pub fn with_config(store: Arc<dyn ObjectStore>, config: &OverlayConfig) -> Self {
        Self {
            store,
            resolver: PathResolver::new(config),
            contexts: DashMap::new(),
            stats: Arc::new(OverlayStats::new()),
        }
    }

    /// Wraps the registry for sharing across sessions and handles.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The registry's path resolver.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// The registry's activity counters.
    pub fn stats(&self) -> Arc<OverlayStats> {
        Arc::clone(&self.stats)
    }

    /// Registers a pseudo entry under `parent`.
    ///
    /// The parent's context is materialized on first registration. Fails
    /// with `NameCollision` if a synthetic entry of the same name
    /// (compared case-insensitively under the default configuration)
    /// already exists there; the existing set is left untouched.
    #[instrument(level = "debug", skip(self, entry), fields(name = %entry.name()))]
    pub fn register(&self, parent: &str, entry: PseudoEntry) -> OverlayResult<()> {
        let norm = self.resolver.normalize(parent)?;
        let key = self.resolver.fold(&norm);

        match self.contexts.entry(key) {
            Entry::Occupied(mut occupied) => {
                let context = occupied.get();
                if context
                    .entries
                    .iter()
                    .any(|e| self.resolver.names_equal(e.name(), entry.name()))
                {
                    self.stats.record_collision();
                    return Err(OverlayError::NameCollision {
                        parent: context.parent.clone(),
                        name: entry.name().to_string(),
                    });
                }
                let mut entries = context.entries.clone();
                entries.push(Arc::new(entry));
                let parent = context.parent.clone();
                *occupied.get_mut() = Arc::new(FolderContext { parent, entries });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(FolderContext {
                    parent: norm.clone(),
                    entries: vec![Arc::new(entry)],
                }));
            }
        }

        self.stats.record_registration();
        debug!(parent = %norm, "registered pseudo entry");
        Ok(())
    }

    /// Removes the synthetic entry named `name` under `parent`.
    ///
    /// No-op if the entry (or the whole context) is absent. A context
    /// whose last entry is removed is dropped entirely.
    #[instrument(level = "debug", skip(self))]
    pub fn unregister(&self, parent: &str, name: &str) -> OverlayResult<()> {
        let key = self.resolver.context_key(parent)?;

        if let Entry::Occupied(mut occupied) = self.contexts.entry(key) {
            let context = occupied.get();
            let entries: Vec<Arc<PseudoEntry>> = context
                .entries
                .iter()
                .filter(|e| !self.resolver.names_equal(e.name(), name))
                .cloned()
                .collect();

            if entries.len() != context.entries.len() {
                debug!(parent = %context.parent, name, "unregistered pseudo entry");
                if entries.is_empty() {
                    occupied.remove();
                } else {
                    let parent = context.parent.clone();
                    *occupied.get_mut() = Arc::new(FolderContext { parent, entries });
                }
            }
        }
        Ok(())
    }

    /// Resolves a single name under `parent`.
    ///
    /// A real entry always shadows a synthetic entry of the same name.
    #[instrument(level = "debug", skip(self))]
    pub async fn lookup(&self, parent: &str, name: &str) -> OverlayResult<OverlayEntry> {
        let norm = self.resolver.normalize(parent)?;
        let key = self.resolver.fold(&norm);
        self.stats.record_lookup();

        if let Some(real) = self.store.get_real(&norm, name).await? {
            trace!(parent = %norm, name, "resolved to real entry");
            return Ok(OverlayEntry::Real(real));
        }

        if let Some(pseudo) = self.find_pseudo(&key, name) {
            trace!(parent = %norm, name, "resolved to pseudo entry");
            return Ok(OverlayEntry::Pseudo(pseudo));
        }

        self.stats.record_lookup_miss();
        Err(OverlayError::NotFound {
            parent: norm,
            name: name.to_string(),
        })
    }

    /// Resolves a full path, splitting it into its `(parent, name)` pair.
    pub async fn lookup_path(&self, path: &str) -> OverlayResult<OverlayEntry> {
        let (parent, name) = self.resolver.split(path)?;
        self.lookup(&parent, &name).await
    }

    /// Lists `parent`: real entries first in the store's native order,
    /// then synthetic entries in registration order, with real entries
    /// shadowing synthetic ones of the same name.
    ///
    /// The result is deterministic and stable across repeated calls
    /// against an unchanged registry. Synthetic membership itself is
    /// served from memory; only the real half touches the store.
    #[instrument(level = "debug", skip(self))]
    pub async fn list(&self, parent: &str) -> OverlayResult<Vec<OverlayEntry>> {
        let norm = self.resolver.normalize(parent)?;
        let key = self.resolver.fold(&norm);
        self.stats.record_listing();

        let real = self.store.list_real(&norm).await?;
        let context = self.contexts.get(&key).map(|c| Arc::clone(c.value()));

        let shadow: HashSet<String> = real
            .iter()
            .map(|e| self.resolver.fold(&e.name))
            .collect();

        let mut merged: Vec<OverlayEntry> = real.into_iter().map(OverlayEntry::Real).collect();

        if let Some(context) = context {
            for entry in &context.entries {
                if shadow.contains(&self.resolver.fold(entry.name())) {
                    trace!(
                        parent = %norm,
                        name = %entry.name(),
                        "pseudo entry shadowed by real entry"
                    );
                    continue;
                }
                merged.push(OverlayEntry::Pseudo(Arc::clone(entry)));
            }
        }

        trace!(parent = %norm, count = merged.len(), "merged listing");
        Ok(merged)
    }

    /// Opens the synthetic entry at `path`.
    ///
    /// Fails with `NotFound` if no synthetic entry is registered there,
    /// and with `NotSupported` if a real entry shadows the name, since real
    /// entries are opened through the backing store, not this overlay.
    pub async fn open(self: &Arc<Self>, path: &str) -> OverlayResult<PseudoHandle> {
        let norm = self.resolver.normalize(path)?;
        let (parent, name) = self.resolver.split(&norm)?;
        let key = self.resolver.fold(&parent);

        let Some(entry) = self.find_pseudo(&key, &name) else {
            return Err(OverlayError::NotFound { parent, name });
        };

        if self.store.get_real(&parent, &name).await?.is_some() {
            return Err(OverlayError::NotSupported(
                "entry is shadowed by a real entry; open it through the backing store",
            ));
        }

        self.stats.record_open();
        debug!(path = %norm, folder = entry.is_folder(), "opened pseudo entry");
        entry.open(&norm, self)
    }

    /// Whether any synthetic entries are registered under `parent`.
    ///
    /// Pure in-memory probe; lets protocol glue skip merge work for
    /// folders the overlay never touched. Malformed paths report `false`.
    pub fn has_pseudo_entries(&self, parent: &str) -> bool {
        self.resolver
            .context_key(parent)
            .map(|key| {
                self.contexts
                    .get(&key)
                    .is_some_and(|c| !c.entries.is_empty())
            })
            .unwrap_or(false)
    }

    /// Tears down the folder context for `parent`, dropping all synthetic
    /// entries registered there. No-op if the context was never
    /// materialized.
    #[instrument(level = "debug", skip(self))]
    pub fn evict(&self, parent: &str) -> OverlayResult<()> {
        let key = self.resolver.context_key(parent)?;
        if let Some((_, context)) = self.contexts.remove(&key) {
            self.stats.record_eviction();
            debug!(parent = %context.parent, entries = context.entries.len(), "evicted folder context");
        }
        Ok(())
    }

    /// Tears down every folder context.
    pub fn clear(&self) {
        let count = self.contexts.len();
        self.contexts.clear();
        for _ in 0..count {
            self.stats.record_eviction();
        }
        debug!(contexts = count, "cleared all folder contexts");
    }

    fn find_pseudo(&self, key: &str, name: &str) -> Option<Arc<PseudoEntry>> {
        let context = self.contexts.get(key)?;
        context
            .entries
            .iter()
            .find(|e| self.resolver.names_equal(e.name(), name))
            .map(Arc::clone)
    }
}

impl std::fmt::Debug for OverlayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayRegistry")
            .field("contexts", &self.contexts.len())
            .finish_non_exhaustive()
    }
}
