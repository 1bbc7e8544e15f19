//! Pseudo entries: the synthetic files and folders the overlay injects.
//!
//! An entry owns one [`EntryDescriptor`] and can produce a
//! [`PseudoHandle`] for a resolved path. Entries are immutable once
//! registered; the registry shares them behind `Arc` so listings and
//! handles never copy entry state.

use crate::content::ContentSource;
use crate::descriptor::{EntryDescriptor, FileAttributes};
use crate::error::{OverlayResult, StoreError};
use crate::handle::{FileHandle, FolderHandle, PseudoHandle};
use crate::registry::OverlayRegistry;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;

/// A synthetic file entry bound to a read-only byte source.
#[derive(Debug, Clone)]
pub struct FilePseudoEntry {
    descriptor: EntryDescriptor,
    source: ContentSource,
}

impl FilePseudoEntry {
    /// Creates a file entry with explicit attributes and source.
    ///
    /// The size is taken from the source: the buffer length for in-memory
    /// content, one stat for local files. Content itself is never touched
    /// here; it materializes on first read.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        attributes: FileAttributes,
        source: ContentSource,
    ) -> OverlayResult<Self> {
        let size = match &source {
            ContentSource::Memory(bytes) => bytes.len() as u64,
            ContentSource::Local(file) => {
                std::fs::metadata(file).map_err(StoreError::Io)?.len()
            }
        };
        let descriptor = EntryDescriptor::build(name, size, attributes, path)?;
        Ok(Self { descriptor, source })
    }

    /// Creates a file entry with in-memory content.
    pub fn from_memory(
        name: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> OverlayResult<Self> {
        Self::new(
            name,
            path,
            FileAttributes::empty(),
            ContentSource::Memory(content.into()),
        )
    }

    /// Creates a file entry whose content is read lazily from `file`.
    pub fn from_local(
        name: impl Into<String>,
        path: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> OverlayResult<Self> {
        Self::new(
            name,
            path,
            FileAttributes::empty(),
            ContentSource::Local(file.into()),
        )
    }

    /// The entry's descriptor.
    pub fn descriptor(&self) -> &EntryDescriptor {
        &self.descriptor
    }

    /// The entry's byte source.
    pub fn source(&self) -> &ContentSource {
        &self.source
    }
}

/// A synthetic folder entry. Carries no content of its own; children are
/// whatever the registry holds for its path.
#[derive(Debug, Clone)]
pub struct FolderPseudoEntry {
    descriptor: EntryDescriptor,
}

impl FolderPseudoEntry {
    /// Creates a folder entry. DIRECTORY and READ_ONLY are always set.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> OverlayResult<Self> {
        Self::with_attributes(name, path, FileAttributes::empty())
    }

    /// Creates a folder entry with extra attribute bits (e.g. HIDDEN).
    pub fn with_attributes(
        name: impl Into<String>,
        path: impl Into<String>,
        attributes: FileAttributes,
    ) -> OverlayResult<Self> {
        let descriptor =
            EntryDescriptor::build(name, 0, attributes | FileAttributes::DIRECTORY, path)?;
        Ok(Self { descriptor })
    }

    /// The entry's descriptor.
    pub fn descriptor(&self) -> &EntryDescriptor {
        &self.descriptor
    }
}

/// A synthetic entry injected by the overlay.
#[derive(Debug, Clone)]
pub enum PseudoEntry {
    /// File entry with a read-only byte source.
    File(FilePseudoEntry),
    /// Folder entry whose listing delegates to the registry.
    Folder(FolderPseudoEntry),
}

impl PseudoEntry {
    /// Convenience constructor for a folder entry.
    pub fn folder(name: impl Into<String>, path: impl Into<String>) -> OverlayResult<Self> {
        Ok(PseudoEntry::Folder(FolderPseudoEntry::new(name, path)?))
    }

    /// Convenience constructor for an in-memory file entry.
    pub fn memory_file(
        name: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> OverlayResult<Self> {
        Ok(PseudoEntry::File(FilePseudoEntry::from_memory(
            name, path, content,
        )?))
    }

    /// Convenience constructor for a local-file-backed entry.
    pub fn local_file(
        name: impl Into<String>,
        path: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> OverlayResult<Self> {
        Ok(PseudoEntry::File(FilePseudoEntry::from_local(
            name, path, file,
        )?))
    }

    /// Entry name, in its registered spelling.
    pub fn name(&self) -> &str {
        self.descriptor().name()
    }

    /// The entry's descriptor.
    pub fn descriptor(&self) -> &EntryDescriptor {
        match self {
            PseudoEntry::File(f) => f.descriptor(),
            PseudoEntry::Folder(d) => d.descriptor(),
        }
    }

    /// Whether this is a folder entry.
    pub fn is_folder(&self) -> bool {
        matches!(self, PseudoEntry::Folder(_))
    }

    /// Opens the entry at `path`, producing a handle for the session.
    ///
    /// File handles serve ranged reads from the entry's byte source;
    /// folder handles delegate enumeration back to `registry` for the
    /// opened path. Both reject writes unconditionally.
    pub fn open(
        self: &Arc<Self>,
        path: &str,
        registry: &Arc<OverlayRegistry>,
    ) -> OverlayResult<PseudoHandle> {
        match self.as_ref() {
            PseudoEntry::File(file) => Ok(PseudoHandle::File(FileHandle::new(
                Arc::clone(self),
                file.source().clone(),
                registry.stats(),
            ))),
            PseudoEntry::Folder(_) => Ok(PseudoHandle::Folder(FolderHandle::new(
                Arc::clone(self),
                path.to_string(),
                Arc::clone(registry),
            ))),
        }
    }
}

impl From<FilePseudoEntry> for PseudoEntry {
    fn from(entry: FilePseudoEntry) -> Self {
        PseudoEntry::File(entry)
    }
}

impl From<FolderPseudoEntry> for PseudoEntry {
    fn from(entry: FolderPseudoEntry) -> Self {
        PseudoEntry::Folder(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_entries_carry_directory_and_read_only() {
        let entry = PseudoEntry::folder("Versions", "/docs/report.txt/Versions").unwrap();
        assert!(entry.is_folder());
        let attrs = entry.descriptor().attributes();
        assert!(attrs.contains(FileAttributes::DIRECTORY));
        assert!(attrs.contains(FileAttributes::READ_ONLY));
        assert_eq!(entry.descriptor().size(), 0);
    }

    #[test]
    fn memory_file_size_is_the_buffer_length() {
        let entry = PseudoEntry::memory_file("v1", "/f/v1", &b"12345"[..]).unwrap();
        assert!(!entry.is_folder());
        assert_eq!(entry.descriptor().size(), 5);
        assert!(entry
            .descriptor()
            .attributes()
            .contains(FileAttributes::READ_ONLY));
    }

    #[test]
    fn local_file_size_comes_from_one_stat() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();

        let entry = PseudoEntry::local_file("data", "/f/data", file.path()).unwrap();
        assert_eq!(entry.descriptor().size(), 10);
    }

    #[test]
    fn hidden_folders_keep_mandatory_bits() {
        let entry =
            FolderPseudoEntry::with_attributes("cfg", "/x/cfg", FileAttributes::HIDDEN).unwrap();
        let attrs = entry.descriptor().attributes();
        assert!(attrs.contains(FileAttributes::HIDDEN));
        assert!(attrs.contains(FileAttributes::DIRECTORY));
        assert!(attrs.contains(FileAttributes::READ_ONLY));
    }

    #[test]
    fn malformed_paths_fail_construction() {
        assert!(PseudoEntry::folder("x", "").is_err());
        assert!(PseudoEntry::memory_file("", "/x", &b""[..]).is_err());
    }
}
