//! Read-only pseudo-entry overlay for network filesystem views.
//!
//! This crate injects synthetic, read-only entries into the directory
//! tree a network file protocol exposes over a versioned object store,
//! merging them with the store's real entries without ever mutating the
//! store. Protocol servers call into the [`OverlayRegistry`] for listing,
//! lookup, and open; the store is reached only through the read-only
//! [`ObjectStore`] trait.
//!
//! # Components
//!
//! - [`EntryDescriptor`] - immutable stat record (size, timestamps,
//!   attribute bits, stable path-derived id)
//! - [`PseudoEntry`] - synthetic file or folder, owning one descriptor
//! - [`PseudoHandle`] - open-session handle; ranged reads, writes always
//!   rejected, idempotent close
//! - [`PathResolver`] - protocol path splitting with case-insensitive,
//!   case-preserving name comparison
//! - [`OverlayRegistry`] - per-parent membership, merge with real
//!   listings, shadowing, lifecycle
//!
//! # Merge rules
//!
//! A real entry always shadows a synthetic entry of the same name.
//! Listings return real entries first, in the store's native order, then
//! synthetic entries in registration order; the order is stable across
//! calls against an unchanged registry.
//!
//! # Example
//!
//! ```
//! use pseudofs_core::testing::MemoryStore;
//! use pseudofs_core::{OverlayRegistry, PseudoEntry};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let rt = tokio::runtime::Builder::new_current_thread().build()?;
//! # rt.block_on(async {
//! let store = Arc::new(MemoryStore::new());
//! store.add_file("/docs", "report.txt", 1024);
//!
//! let registry = OverlayRegistry::new(store).into_shared();
//! registry.register(
//!     "/docs/report.txt",
//!     PseudoEntry::folder("Versions", "/docs/report.txt/Versions")?,
//! )?;
//!
//! let listing = registry.list("/docs/report.txt").await?;
//! assert_eq!(listing.len(), 1);
//! assert_eq!(listing[0].name(), "Versions");
//!
//! let handle = registry.open("/docs/report.txt/Versions").await?;
//! assert!(handle.write(0, b"nope").is_err());
//! # Ok::<(), pseudofs_core::OverlayError>(())
//! # })?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod content;
mod descriptor;
mod entry;
mod error;
mod handle;
mod path;
mod registry;
mod stats;
mod store;

/// Testing utilities: in-memory backing store and fixture helpers.
pub mod testing;

pub use config::OverlayConfig;
pub use content::ContentSource;
pub use descriptor::{path_file_id, EntryDescriptor, FileAttributes};
pub use entry::{FilePseudoEntry, FolderPseudoEntry, PseudoEntry};
pub use error::{ErrorCategory, OverlayError, OverlayResult, StoreError};
pub use handle::{FileHandle, FolderHandle, PseudoHandle};
pub use path::PathResolver;
pub use registry::{OverlayEntry, OverlayRegistry};
pub use stats::{OverlayStats, OverlayStatsSnapshot};
pub use store::{ObjectStore, StoreEntry};
