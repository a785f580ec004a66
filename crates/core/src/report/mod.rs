//! CSV reports.
//!
//! Scanner output is written from typed rows; lookup input and output go
//! through [`CsvTable`] so unknown input columns survive enrichment. Every
//! write lands in a temp file next to the target and is renamed into place.

mod scan;
mod table;

pub use scan::{write_lost, write_low_quality};
pub use table::{read_lookup_input, read_table, write_table, CsvTable, REQUIRED_LOOKUP_COLUMNS};

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors reading or writing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{path}:{line}: expected {expected} fields, found {found}")]
    MalformedRow {
        path: PathBuf,
        line: u64,
        expected: u64,
        found: u64,
    },

    #[error("{path} is missing required columns: {}", missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
}

impl ReportError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Write through a CSV writer into a temp file, then rename it over `path`.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<(), ReportError>
where
    F: FnOnce(&mut csv::Writer<&mut NamedTempFile>) -> Result<(), ReportError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ReportError::io(dir, e))?;
    {
        let mut writer = csv::Writer::from_writer(&mut tmp);
        write(&mut writer)?;
        writer.flush().map_err(|e| ReportError::io(path, e))?;
    }
    tmp.as_file_mut()
        .flush()
        .map_err(|e| ReportError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| ReportError::io(path, e.error))?;
    Ok(())
}
