use std::path::Path;

use tracing::info;

use super::{write_atomically, ReportError};
use crate::scanner::{LostRow, LowQualityRow};

/// Write the low-quality report. Headers are written even with no rows.
pub fn write_low_quality(path: &Path, rows: &[LowQualityRow]) -> Result<(), ReportError> {
    write_rows(
        path,
        &[
            "path",
            "title",
            "year",
            "reason",
            "size_bytes",
            "extension",
            "size_mib",
            "tokens",
        ],
        rows,
    )
}

/// Write the lost-folders report. Headers are written even with no rows.
pub fn write_lost(path: &Path, rows: &[LostRow]) -> Result<(), ReportError> {
    write_rows(
        path,
        &[
            "path",
            "title",
            "year",
            "reason",
            "file_count",
            "video_count",
            "subtitle_count",
        ],
        rows,
    )
}

fn write_rows<T: serde::Serialize>(
    path: &Path,
    headers: &[&str],
    rows: &[T],
) -> Result<(), ReportError> {
    write_atomically(path, |writer| {
        if rows.is_empty() {
            writer.write_record(headers)?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        Ok(())
    })?;
    info!(path = %path.display(), rows = rows.len(), "Wrote report");
    Ok(())
}
