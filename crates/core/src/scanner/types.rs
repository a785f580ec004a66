//! Types produced by a library scan.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a library item is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Directory,
}

/// Classification outcome attached to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemFlag {
    LowQualitySize,
    LowQualityToken,
    Lost,
}

/// A video file or a leaf directory seen during a scan.
#[derive(Debug, Clone)]
pub struct LibraryItem {
    pub path: PathBuf,
    pub kind: ItemKind,
    /// File size, or total video bytes for a directory.
    pub size_bytes: u64,
    /// Lowercase extension without the dot; empty for directories.
    pub extension: String,
    pub flags: Vec<ItemFlag>,
}

impl LibraryItem {
    pub fn file(path: PathBuf, size_bytes: u64, extension: String) -> Self {
        Self {
            path,
            kind: ItemKind::File,
            size_bytes,
            extension,
            flags: Vec::new(),
        }
    }

    pub fn directory(path: PathBuf, size_bytes: u64) -> Self {
        Self {
            path,
            kind: ItemKind::Directory,
            size_bytes,
            extension: String::new(),
            flags: Vec::new(),
        }
    }

    pub fn has_flag(&self, flag: ItemFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_flagged(&self) -> bool {
        !self.flags.is_empty()
    }
}

/// Why a file was flagged as low quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reason {
    /// Smaller than the tiny-size threshold.
    Size,
    /// Matched a low-quality token.
    Token,
    /// Both of the above.
    Both,
}

impl Reason {
    pub fn from_flags(size: bool, token: bool) -> Option<Self> {
        match (size, token) {
            (true, true) => Some(Reason::Both),
            (true, false) => Some(Reason::Size),
            (false, true) => Some(Reason::Token),
            (false, false) => None,
        }
    }

    pub fn includes_size(&self) -> bool {
        matches!(self, Reason::Size | Reason::Both)
    }

    pub fn includes_token(&self) -> bool {
        matches!(self, Reason::Token | Reason::Both)
    }
}

/// Why a leaf directory is considered lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LostReason {
    NoVideos,
    ZeroByteVideosOnly,
}

/// One row of the low-quality report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowQualityRow {
    pub path: String,
    pub title: String,
    pub year: Option<u16>,
    pub reason: Reason,
    pub size_bytes: u64,
    pub extension: String,
    pub size_mib: String,
    /// Matched low-quality tokens, pipe-joined.
    pub tokens: String,
}

/// One row of the lost report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostRow {
    pub path: String,
    pub title: String,
    pub year: Option<u16>,
    pub reason: LostReason,
    pub file_count: usize,
    pub video_count: usize,
    pub subtitle_count: usize,
}

/// A filesystem problem that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: Option<PathBuf>,
    pub message: String,
}

/// Counters for a finished scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub directories: usize,
    pub files: usize,
    pub video_files: usize,
    pub pruned_directories: usize,
}

/// Everything a scan produces.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Every video file and leaf directory, in walk order.
    pub items: Vec<LibraryItem>,
    pub low_quality: Vec<LowQualityRow>,
    pub lost: Vec<LostRow>,
    pub warnings: Vec<ScanWarning>,
    pub stats: ScanStats,
}
