//! Overlay configuration.

use serde::{Deserialize, Serialize};

/// Configuration for an overlay registry.
///
/// The separator is whatever the wire protocol uses (`/` for WebDAV/NFS
/// style paths, `\` for SMB); name comparison is case-insensitive by
/// default but preserves the registered spelling for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Path separator used by the protocol feeding this overlay.
    pub separator: char,
    /// Whether name comparison folds case.
    pub case_insensitive: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            separator: '/',
            case_insensitive: true,
        }
    }
}
