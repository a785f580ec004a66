//! Per-file and per-directory classification.

use super::rules::ScanRules;
use super::types::{LostReason, Reason};
use crate::config::Precedence;

/// Result of flagging a video file as low quality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowQualityVerdict {
    pub reason: Reason,
    /// Matched low-quality tokens, lowercase and sorted.
    pub tokens: Vec<String>,
}

/// What the walk learned about one directory's direct children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirSummary {
    pub file_count: usize,
    pub video_count: usize,
    pub nonempty_video_count: usize,
    pub subtitle_count: usize,
    pub video_bytes: u64,
    pub has_subdirs: bool,
    /// A direct subdirectory is named like `Title (YYYY)`.
    pub has_title_subdirs: bool,
}

impl DirSummary {
    pub fn is_leaf(&self) -> bool {
        !self.has_subdirs
    }

    pub fn has_nonempty_video(&self) -> bool {
        self.nonempty_video_count > 0
    }

    /// Whether this folder counts as a movie folder for the leaves below
    /// it. Collection containers holding `Title (YYYY)` folders never do.
    pub fn owns_accessory_leaves(&self) -> bool {
        self.has_nonempty_video() && !self.has_title_subdirs
    }
}

/// Classify a file by its containing folder name, file name and size.
///
/// Returns `None` for non-video files and for videos that pass.
pub fn is_low_quality(
    rules: &ScanRules,
    folder_name: &str,
    file_name: &str,
    size_bytes: u64,
) -> Option<LowQualityVerdict> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default();
    if !rules.is_video(extension) {
        return None;
    }

    let names = [folder_name, file_name];
    let has_good = !rules.matched_good_tokens(&names).is_empty();
    let tokens = rules.matched_low_quality_tokens(&names);

    let tiny = size_bytes < rules.tiny_bytes();
    let (size_flag, token_flag) = match (rules.precedence(), has_good) {
        (_, false) => (tiny, !tokens.is_empty()),
        (Precedence::GoodTokenWins, true) => (false, false),
        (Precedence::StrictLowQuality, true) => (false, !tokens.is_empty()),
    };

    Reason::from_flags(size_flag, token_flag).map(|reason| LowQualityVerdict {
        reason,
        tokens: if token_flag { tokens } else { Vec::new() },
    })
}

/// Classify a leaf directory from its summary.
///
/// Returns `None` when the directory holds at least one non-empty video.
pub fn is_lost(summary: &DirSummary) -> Option<LostReason> {
    if summary.video_count == 0 {
        Some(LostReason::NoVideos)
    } else if summary.nonempty_video_count == 0 {
        Some(LostReason::ZeroByteVideosOnly)
    } else {
        None
    }
}
