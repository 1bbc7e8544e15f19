//! Immutable metadata records for pseudo entries.
//!
//! An [`EntryDescriptor`] answers stat-style queries for a single entry.
//! Every field is fixed at construction: pseudo entries are snapshots, not
//! live views, so timestamps deliberately reflect the construction instant
//! rather than any backing-store state.

use crate::error::{OverlayError, OverlayResult};
use bitflags::bitflags;
use std::time::SystemTime;

bitflags! {
    /// File attribute bits, using the DOS/SMB attribute values network
    /// file protocols expect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileAttributes: u32 {
        /// Entry cannot be written.
        const READ_ONLY = 0x0001;
        /// Entry is hidden from normal directory views.
        const HIDDEN = 0x0002;
        /// Entry belongs to the system.
        const SYSTEM = 0x0004;
        /// Entry is a folder.
        const DIRECTORY = 0x0010;
        /// Entry is marked for archiving.
        const ARCHIVE = 0x0020;
    }
}

/// Derives the stable identifier for a logical path.
///
/// CRC-32 over the case-folded path bytes: identical paths always yield
/// identical ids within (and across) process lifetimes. CRC-32 is not
/// collision-resistant; the id is an identity hint for the protocol layer,
/// not a globally unique key.
pub fn path_file_id(path: &str) -> u32 {
    crc32fast::hash(path.to_lowercase().as_bytes())
}

/// Immutable stat record for a pseudo entry.
///
/// Constructed once via [`EntryDescriptor::build`]; no setters exist.
#[derive(Debug, Clone)]
pub struct EntryDescriptor {
    name: String,
    size: u64,
    attributes: FileAttributes,
    created: SystemTime,
    modified: SystemTime,
    accessed: SystemTime,
    changed: SystemTime,
    file_id: u32,
    path: String,
}

impl EntryDescriptor {
    /// Builds a descriptor for the entry at `path`.
    ///
    /// All four timestamps are stamped with the construction instant, the
    /// id is derived from the path, and `READ_ONLY` is always set: no
    /// writable pseudo entry exists.
    ///
    /// Fails with `InvalidPath` when the name or path is empty or the path
    /// contains a NUL byte; this is the only construction-time failure.
    pub fn build(
        name: impl Into<String>,
        size: u64,
        attributes: FileAttributes,
        path: impl Into<String>,
    ) -> OverlayResult<Self> {
        let name = name.into();
        let path = path.into();

        if name.is_empty() {
            return Err(OverlayError::InvalidPath {
                path,
                reason: "entry name is empty",
            });
        }
        if path.is_empty() {
            return Err(OverlayError::InvalidPath {
                path,
                reason: "path is empty",
            });
        }
        if path.contains('\0') || name.contains('\0') {
            return Err(OverlayError::InvalidPath {
                path,
                reason: "path contains a NUL byte",
            });
        }

        let now = SystemTime::now();
        let file_id = path_file_id(&path);

        Ok(Self {
            name,
            size,
            attributes: attributes | FileAttributes::READ_ONLY,
            created: now,
            modified: now,
            accessed: now,
            changed: now,
            file_id,
            path,
        })
    }

    /// Entry name, in its registered spelling.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content size in bytes; 0 for folders.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Attribute bitmask.
    pub fn attributes(&self) -> FileAttributes {
        self.attributes
    }

    /// Creation timestamp (the construction instant).
    pub fn created(&self) -> SystemTime {
        self.created
    }

    /// Modification timestamp (the construction instant).
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Access timestamp (the construction instant).
    pub fn accessed(&self) -> SystemTime {
        self.accessed
    }

    /// Status-change timestamp (the construction instant).
    pub fn changed(&self) -> SystemTime {
        self.changed
    }

    /// Stable identifier derived from the path.
    pub fn file_id(&self) -> u32 {
        self.file_id
    }

    /// Logical path of the entry.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the DIRECTORY attribute is set.
    pub fn is_directory(&self) -> bool {
        self.attributes.contains(FileAttributes::DIRECTORY)
    }
}
