//! Protocol path splitting and normalization.
//!
//! Wire protocols hand the overlay absolute paths using their own
//! separator convention. The resolver normalizes those into a canonical
//! form (leading separator, no trailing separator), splits them into
//! `(parent, name)` pairs, and produces the case-folded keys used for
//! comparison while the registered spelling is kept for display.

use crate::config::OverlayConfig;
use crate::error::{OverlayError, OverlayResult};

/// Splits and normalizes protocol paths.
#[derive(Debug, Clone)]
pub struct PathResolver {
    separator: char,
    case_insensitive: bool,
}

impl PathResolver {
    /// Creates a resolver from an overlay configuration.
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            separator: config.separator,
            case_insensitive: config.case_insensitive,
        }
    }

    /// The configured separator.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Canonical form of the root path.
    pub fn root(&self) -> String {
        self.separator.to_string()
    }

    /// Normalizes a path to `<sep>seg<sep>seg...` form.
    ///
    /// Accepts an optional leading separator and at most one trailing
    /// separator. Rejects empty paths, empty segments, NUL bytes, and
    /// segments containing a foreign separator.
    pub fn normalize(&self, path: &str) -> OverlayResult<String> {
        let sep = self.separator;

        if path.is_empty() {
            return Err(self.invalid(path, "empty path"));
        }
        if path.contains('\0') {
            return Err(self.invalid(path, "path contains a NUL byte"));
        }
        if path == self.root() {
            return Ok(self.root());
        }

        let body = path.strip_prefix(sep).unwrap_or(path);
        let body = body.strip_suffix(sep).unwrap_or(body);
        if body.is_empty() {
            return Err(self.invalid(path, "empty segment"));
        }

        for segment in body.split(sep) {
            if segment.is_empty() {
                return Err(self.invalid(path, "empty segment"));
            }
            if segment
                .chars()
                .any(|c| (c == '/' || c == '\\') && c != sep)
            {
                return Err(self.invalid(path, "segment contains a disallowed separator"));
            }
        }

        Ok(format!("{sep}{body}"))
    }

    /// Splits a path into its normalized `(parent, name)` pair.
    ///
    /// The root path has no parent and is rejected with `InvalidPath`.
    pub fn split(&self, path: &str) -> OverlayResult<(String, String)> {
        let norm = self.normalize(path)?;
        if norm == self.root() {
            return Err(self.invalid(path, "root has no parent"));
        }

        let sep = self.separator;
        let body = &norm[sep.len_utf8()..];
        match body.rfind(sep) {
            Some(i) => {
                let name = body[i + sep.len_utf8()..].to_string();
                Ok((format!("{sep}{}", &body[..i]), name))
            }
            None => Ok((self.root(), body.to_string())),
        }
    }

    /// Joins a normalized parent path and a child name.
    pub fn join(&self, parent: &str, name: &str) -> String {
        let sep = self.separator;
        if parent == self.root() {
            format!("{sep}{name}")
        } else {
            let trimmed = parent.strip_suffix(sep).unwrap_or(parent);
            format!("{trimmed}{sep}{name}")
        }
    }

    /// Case-folds a string for comparison; the original spelling is kept
    /// for display elsewhere.
    pub fn fold(&self, s: &str) -> String {
        if self.case_insensitive {
            s.to_lowercase()
        } else {
            s.to_string()
        }
    }

    /// Whether two names refer to the same entry under this resolver.
    pub fn names_equal(&self, a: &str, b: &str) -> bool {
        if self.case_insensitive {
            // Avoid allocating for the pure-ASCII common case.
            if a.is_ascii() && b.is_ascii() {
                a.eq_ignore_ascii_case(b)
            } else {
                a.to_lowercase() == b.to_lowercase()
            }
        } else {
            a == b
        }
    }

    /// Canonical folded key identifying a parent folder context.
    pub fn context_key(&self, parent: &str) -> OverlayResult<String> {
        Ok(self.fold(&self.normalize(parent)?))
    }

    fn invalid(&self, path: &str, reason: &'static str) -> OverlayError {
        OverlayError::InvalidPath {
            path: path.to_string(),
            reason,
        }
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(&OverlayConfig::default())
    }
}
