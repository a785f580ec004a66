//! Library scanner.
//!
//! Walks a media library once, depth-first in lexical order, and produces
//! two row sets:
//! - low-quality video files (tiny size or low-quality release tokens)
//! - lost leaf directories (no usable video left)
//!
//! Junk and hidden directories are pruned before they are entered.

mod classify;
mod rules;
mod types;
mod walk;

pub use classify::{is_lost, is_low_quality, DirSummary, LowQualityVerdict};
pub use rules::ScanRules;
pub use types::{
    ItemFlag, ItemKind, LibraryItem, LostReason, LostRow, LowQualityRow, Reason, ScanReport,
    ScanStats, ScanWarning,
};
pub use walk::scan_library;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot read library root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("library root is not a directory: {0}")]
    NotADirectory(PathBuf),
}
