//! Error types for the overlay core.
//!
//! Every error is local to the offending call: nothing here is fatal to the
//! hosting process and no error path leaves registry state partially
//! updated. Protocol servers translate [`OverlayError`] values into their
//! own wire responses via [`ErrorCategory`] rather than matching on the
//! full enum.

use std::io;
use thiserror::Error;

/// Errors surfaced by overlay operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The supplied path is malformed (empty, empty segment, NUL byte, or
    /// a foreign separator inside a segment).
    #[error("invalid path `{path}`: {reason}")]
    InvalidPath {
        /// The offending path as supplied by the caller.
        path: String,
        /// What made the path invalid.
        reason: &'static str,
    },

    /// A pseudo entry with the same name is already registered under the
    /// parent. Registration-time only; never corrupts the existing set.
    #[error("a pseudo entry named `{name}` already exists under `{parent}`")]
    NameCollision {
        /// Parent folder path.
        parent: String,
        /// The colliding entry name.
        name: String,
    },

    /// Neither the backing store nor the overlay knows the entry.
    #[error("no entry named `{name}` under `{parent}`")]
    NotFound {
        /// Parent folder path.
        parent: String,
        /// The name that was looked up.
        name: String,
    },

    /// The operation is not supported on synthetic state. Every write
    /// attempt on a pseudo entry lands here.
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    /// A backing byte source or the object store failed.
    #[error("backing store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors produced by the backing object store and by backing byte sources.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Store-specific failure reported by the backend.
    #[error("{0}")]
    Backend(String),
}

/// Result type for overlay operations.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Classification of overlay errors for protocol translation.
///
/// Wire servers map categories onto their own status codes (HTTP status,
/// SMB NTSTATUS, NFS nfsstat) without depending on the error enum's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Entry does not exist.
    NotFound,
    /// Entry already exists.
    AlreadyExists,
    /// The caller attempted to mutate read-only state.
    PermissionDenied,
    /// Malformed argument (path syntax).
    InvalidArgument,
    /// Operation has no meaning for the target.
    NotSupported,
    /// Underlying I/O failure.
    IoError,
}

impl ErrorCategory {
    /// Maps the category to a POSIX errno value.
    pub fn to_errno(self) -> i32 {
        match self {
            ErrorCategory::NotFound => libc::ENOENT,
            ErrorCategory::AlreadyExists => libc::EEXIST,
            ErrorCategory::PermissionDenied => libc::EACCES,
            ErrorCategory::InvalidArgument => libc::EINVAL,
            ErrorCategory::NotSupported => libc::ENOTSUP,
            ErrorCategory::IoError => libc::EIO,
        }
    }
}

impl From<&OverlayError> for ErrorCategory {
    fn from(e: &OverlayError) -> Self {
        match e {
            OverlayError::InvalidPath { .. } => ErrorCategory::InvalidArgument,
            OverlayError::NameCollision { .. } => ErrorCategory::AlreadyExists,
            OverlayError::NotFound { .. } => ErrorCategory::NotFound,
            OverlayError::NotSupported(_) => ErrorCategory::PermissionDenied,
            OverlayError::Store(_) => ErrorCategory::IoError,
        }
    }
}

impl OverlayError {
    /// Returns the protocol-facing category for this error.
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_map_to_expected_errnos() {
        let e = OverlayError::NotFound {
            parent: "/a".into(),
            name: "b".into(),
        };
        assert_eq!(e.category(), ErrorCategory::NotFound);
        assert_eq!(e.category().to_errno(), libc::ENOENT);

        let e = OverlayError::NotSupported("write");
        assert_eq!(e.category(), ErrorCategory::PermissionDenied);
        assert_eq!(e.category().to_errno(), libc::EACCES);

        let e = OverlayError::NameCollision {
            parent: "/a".into(),
            name: "b".into(),
        };
        assert_eq!(e.category().to_errno(), libc::EEXIST);
    }

    #[test]
    fn store_errors_classify_as_io() {
        let e = OverlayError::from(StoreError::Backend("offline".into()));
        assert_eq!(e.category(), ErrorCategory::IoError);

        let e = OverlayError::from(StoreError::from(io::Error::new(
            io::ErrorKind::NotFound,
            "gone",
        )));
        assert_eq!(e.category().to_errno(), libc::EIO);
    }

    #[test]
    fn display_includes_context() {
        let e = OverlayError::NameCollision {
            parent: "/docs".into(),
            name: "Versions".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("/docs"));
        assert!(msg.contains("Versions"));
    }
}
