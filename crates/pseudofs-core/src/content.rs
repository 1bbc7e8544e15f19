//! Read-only byte sources for file pseudo entries.
//!
//! A [`ContentSource`] is bound to a file entry at construction but its
//! bytes are materialized only on first read. Directory enumeration never
//! touches a source, so listing latency stays independent of content size.

use crate::error::{OverlayResult, StoreError};
use bytes::Bytes;
use std::path::PathBuf;
use tracing::trace;

/// Where a file pseudo entry's bytes come from.
#[derive(Debug, Clone)]
pub enum ContentSource {
    /// Bytes baked into the entry at construction.
    Memory(Bytes),
    /// Bytes read lazily from a file on the local filesystem.
    Local(PathBuf),
}

impl ContentSource {
    /// Materializes the full content.
    ///
    /// `Memory` sources are a cheap reference-count bump; `Local` sources
    /// read the file. Callers cache the result per handle, so each open
    /// handle pays for at most one materialization.
    pub(crate) async fn materialize(&self) -> OverlayResult<Bytes> {
        match self {
            ContentSource::Memory(bytes) => Ok(bytes.clone()),
            ContentSource::Local(path) => {
                trace!(path = %path.display(), "materializing local content");
                let data = tokio::fs::read(path).await.map_err(StoreError::Io)?;
                Ok(Bytes::from(data))
            }
        }
    }
}
