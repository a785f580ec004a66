//! Single-pass library walk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::classify::{is_lost, is_low_quality, DirSummary};
use super::rules::ScanRules;
use super::types::{
    ItemFlag, LibraryItem, LostRow, LowQualityRow, ScanReport, ScanWarning,
};
use super::ScanError;
use crate::metrics;
use crate::title::{parse_path_title, parse_title};

const MIB: f64 = 1024.0 * 1024.0;

/// Walk `root` and classify every video file and leaf directory.
///
/// Only a missing or unreadable root is an error. Every other filesystem
/// problem becomes a [`ScanWarning`].
pub fn scan_library(root: &Path, rules: &ScanRules) -> Result<ScanReport, ScanError> {
    let meta = std::fs::metadata(root).map_err(|source| ScanError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    info!(root = %root.display(), "Scanning library");

    let mut report = ScanReport::default();
    let mut dirs: Vec<PathBuf> = Vec::new();
    let mut summaries: HashMap<PathBuf, DirSummary> = HashMap::new();
    let mut pruned = 0usize;

    let walker = WalkDir::new(root)
        .follow_links(rules.follow_symlinks())
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if rules.is_pruned_dir(&name) {
                debug!(path = %entry.path().display(), "Pruning directory");
                pruned += 1;
                false
            } else {
                true
            }
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                // An unlistable directory was already yielded as an entry;
                // its contents are unknown, so it is never a lost leaf.
                if let Some(path) = err.path() {
                    if summaries.remove(path).is_some() {
                        dirs.retain(|d| d != path);
                    }
                }
                record_warning(
                    &mut report,
                    err.path().map(Path::to_path_buf),
                    err.to_string(),
                );
                continue;
            }
        };
        let path = entry.path();

        if entry.file_type().is_dir() {
            report.stats.directories += 1;
            if entry.depth() > 0 {
                let name = entry.file_name().to_string_lossy();
                let titled = parse_title(&name, None, rules.years()).is_structured();
                if let Some(parent) = path.parent().and_then(|p| summaries.get_mut(p)) {
                    parent.has_subdirs = true;
                    parent.has_title_subdirs |= titled;
                }
            }
            dirs.push(path.to_path_buf());
            summaries.insert(path.to_path_buf(), DirSummary::default());
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => {
                record_warning(&mut report, Some(path.to_path_buf()), err.to_string());
                continue;
            }
        };
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let is_video = rules.is_video(&extension);
        if size == 0 && !is_video {
            continue;
        }

        report.stats.files += 1;
        if let Some(summary) = path.parent().and_then(|p| summaries.get_mut(p)) {
            summary.file_count += 1;
            if rules.is_subtitle(&extension) {
                summary.subtitle_count += 1;
            }
            if is_video {
                summary.video_count += 1;
                if size > 0 {
                    summary.nonempty_video_count += 1;
                    summary.video_bytes += size;
                }
            }
        }

        if is_video {
            report.stats.video_files += 1;
            classify_file(&mut report, rules, path, size, extension);
        }
    }

    report.stats.pruned_directories = pruned;

    for dir in &dirs {
        let Some(summary) = summaries.get(dir) else {
            continue;
        };
        if !summary.is_leaf() {
            continue;
        }
        let Some(reason) = is_lost(summary) else {
            metrics::SCAN_ITEMS.with_label_values(&["ok"]).inc();
            let item = LibraryItem::directory(dir.clone(), summary.video_bytes);
            report.items.push(item);
            continue;
        };
        if rules.skip_accessory_leaves() && ancestor_has_video(dir, root, &summaries) {
            debug!(path = %dir.display(), "Skipping accessory leaf");
            continue;
        }

        let parsed = parse_path_title(dir, true, rules.years());
        report.lost.push(LostRow {
            path: dir.display().to_string(),
            title: parsed.title().to_string(),
            year: parsed.year(),
            reason,
            file_count: summary.file_count,
            video_count: summary.video_count,
            subtitle_count: summary.subtitle_count,
        });

        let mut item = LibraryItem::directory(dir.clone(), summary.video_bytes);
        item.flags.push(ItemFlag::Lost);
        report.items.push(item);
        metrics::SCAN_ITEMS.with_label_values(&["lost"]).inc();
    }

    info!(
        directories = report.stats.directories,
        video_files = report.stats.video_files,
        low_quality = report.low_quality.len(),
        lost = report.lost.len(),
        warnings = report.warnings.len(),
        "Scan complete"
    );

    Ok(report)
}

fn classify_file(
    report: &mut ScanReport,
    rules: &ScanRules,
    path: &Path,
    size: u64,
    extension: String,
) {
    let folder_name = path
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut item = LibraryItem::file(path.to_path_buf(), size, extension);
    let Some(verdict) = is_low_quality(rules, &folder_name, &file_name, size) else {
        metrics::SCAN_ITEMS.with_label_values(&["ok"]).inc();
        report.items.push(item);
        return;
    };

    if verdict.reason.includes_size() {
        item.flags.push(ItemFlag::LowQualitySize);
    }
    if verdict.reason.includes_token() {
        item.flags.push(ItemFlag::LowQualityToken);
    }

    let parsed = parse_path_title(path, false, rules.years());
    debug!(
        path = %path.display(),
        reason = ?verdict.reason,
        "Low quality video"
    );
    report.low_quality.push(LowQualityRow {
        path: path.display().to_string(),
        title: parsed.title().to_string(),
        year: parsed.year(),
        reason: verdict.reason,
        size_bytes: size,
        extension: item.extension.clone(),
        size_mib: format!("{:.2}", size as f64 / MIB),
        tokens: verdict.tokens.join("|"),
    });
    report.items.push(item);
    metrics::SCAN_ITEMS.with_label_values(&["low_quality"]).inc();
}

/// Whether any directory strictly above `dir`, up to and including `root`,
/// is a movie folder that directly holds a non-empty video.
fn ancestor_has_video(dir: &Path, root: &Path, summaries: &HashMap<PathBuf, DirSummary>) -> bool {
    if dir == root {
        return false;
    }
    dir.ancestors()
        .skip(1)
        .take_while(|p| p.starts_with(root))
        .any(|p| summaries.get(p).is_some_and(DirSummary::owns_accessory_leaves))
}

fn record_warning(report: &mut ScanReport, path: Option<PathBuf>, message: String) {
    warn!(
        path = ?path.as_ref().map(|p| p.display().to_string()),
        error = %message,
        "Skipping unreadable entry"
    );
    metrics::SCAN_WARNINGS.inc();
    report.warnings.push(ScanWarning { path, message });
}
