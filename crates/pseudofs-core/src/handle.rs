//! Session handles for open pseudo entries.
//!
//! A [`PseudoHandle`] is bound to exactly one entry for the life of one
//! open session. Entries are immutable, so any number of handles may be
//! open on the same entry; the only mutable state a handle owns is its
//! own lazily materialized buffer.

use crate::content::ContentSource;
use crate::descriptor::EntryDescriptor;
use crate::entry::PseudoEntry;
use crate::error::{OverlayError, OverlayResult};
use crate::registry::{OverlayEntry, OverlayRegistry};
use crate::stats::OverlayStats;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// An open handle on a pseudo entry.
#[derive(Debug)]
pub enum PseudoHandle {
    /// Handle on a file entry; serves ranged reads.
    File(FileHandle),
    /// Handle on a folder entry; delegates enumeration to the registry.
    Folder(FolderHandle),
}

/// Handle state for an open file entry.
#[derive(Debug)]
pub struct FileHandle {
    entry: Arc<PseudoEntry>,
    source: ContentSource,
    state: Mutex<FileHandleState>,
    stats: Arc<OverlayStats>,
}

#[derive(Debug)]
struct FileHandleState {
    /// Materialized content; populated on first read, dropped on close.
    content: Option<Bytes>,
    closed: bool,
}

impl FileHandle {
    pub(crate) fn new(
        entry: Arc<PseudoEntry>,
        source: ContentSource,
        stats: Arc<OverlayStats>,
    ) -> Self {
        Self {
            entry,
            source,
            state: Mutex::new(FileHandleState {
                content: None,
                closed: false,
            }),
            stats,
        }
    }

    async fn read(&self, offset: u64, count: usize) -> OverlayResult<Bytes> {
        let mut state = self.state.lock().await;
        if state.closed {
            // A closed handle reads as end-of-file; it never resurrects
            // the released buffer.
            return Ok(Bytes::new());
        }

        let content = match &state.content {
            Some(content) => content.clone(),
            None => {
                let content = self.source.materialize().await?;
                trace!(
                    path = %self.entry.descriptor().path(),
                    len = content.len(),
                    "materialized content on first read"
                );
                state.content = Some(content.clone());
                content
            }
        };

        let len = content.len();
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        if start >= len {
            return Ok(Bytes::new());
        }
        let end = start.saturating_add(count).min(len);
        let slice = content.slice(start..end);
        self.stats.record_read(slice.len() as u64);
        Ok(slice)
    }

    async fn close(&self) {
        let mut state = self.state.lock().await;
        state.content = None;
        state.closed = true;
    }
}

/// Handle state for an open folder entry.
#[derive(Debug)]
pub struct FolderHandle {
    entry: Arc<PseudoEntry>,
    path: String,
    registry: Arc<OverlayRegistry>,
    closed: AtomicBool,
}

impl FolderHandle {
    pub(crate) fn new(entry: Arc<PseudoEntry>, path: String, registry: Arc<OverlayRegistry>) -> Self {
        Self {
            entry,
            path,
            registry,
            closed: AtomicBool::new(false),
        }
    }

    /// The path this handle was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl PseudoHandle {
    /// Reads up to `count` bytes starting at `offset`.
    ///
    /// An empty buffer signals end-of-file, which is a normal boundary
    /// and not an error. Folder handles always read as empty and never
    /// block; file handles materialize their byte source on the first
    /// call.
    pub async fn read(&self, offset: u64, count: usize) -> OverlayResult<Bytes> {
        match self {
            PseudoHandle::File(h) => h.read(offset, count).await,
            PseudoHandle::Folder(_) => Ok(Bytes::new()),
        }
    }

    /// Writes are never supported: no writable pseudo entry exists.
    pub fn write(&self, _offset: u64, _data: &[u8]) -> OverlayResult<()> {
        debug!(path = %self.descriptor().path(), "write rejected on pseudo entry");
        Err(OverlayError::NotSupported(
            "pseudo entries are read-only",
        ))
    }

    /// Enumerates the children of an open folder.
    ///
    /// Delegates to the registry for the opened path, merging synthetic
    /// children with whatever the backing store holds there. Fails with
    /// `NotSupported` on file handles.
    pub async fn list(&self) -> OverlayResult<Vec<OverlayEntry>> {
        match self {
            PseudoHandle::Folder(h) => h.registry.list(&h.path).await,
            PseudoHandle::File(_) => Err(OverlayError::NotSupported(
                "byte handles do not enumerate",
            )),
        }
    }

    /// Closes the handle, releasing any materialized buffer.
    ///
    /// Idempotent, and safe to call while a `read` is outstanding: the
    /// entry itself is immutable and the buffer is private to this
    /// handle, so a racing read either completes against the old buffer
    /// or observes end-of-file.
    pub async fn close(&self) {
        match self {
            PseudoHandle::File(h) => h.close().await,
            PseudoHandle::Folder(h) => h.closed.store(true, Ordering::Relaxed),
        }
    }

    /// Whether the handle has been closed.
    pub async fn is_closed(&self) -> bool {
        match self {
            PseudoHandle::File(h) => h.state.lock().await.closed,
            PseudoHandle::Folder(h) => h.closed.load(Ordering::Relaxed),
        }
    }

    /// Descriptor of the entry this handle is bound to.
    pub fn descriptor(&self) -> &EntryDescriptor {
        match self {
            PseudoHandle::File(h) => h.entry.descriptor(),
            PseudoHandle::Folder(h) => h.entry.descriptor(),
        }
    }

    /// Name of the entry this handle is bound to.
    pub fn name(&self) -> &str {
        self.descriptor().name()
    }

    /// Whether this handle is bound to a folder entry.
    pub fn is_folder(&self) -> bool {
        matches!(self, PseudoHandle::Folder(_))
    }
}
