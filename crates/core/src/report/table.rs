use std::path::Path;

use super::{write_atomically, ReportError};

/// Columns the lookup pipeline needs in its input.
pub const REQUIRED_LOOKUP_COLUMNS: [&str; 3] = ["path", "title", "year"];

/// A CSV file held in memory as strings, header order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of `name`, appending an empty column if it is missing.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Cell value, empty when the column is missing.
    pub fn get(&self, row: usize, name: &str) -> &str {
        self.column(name)
            .and_then(|col| self.rows.get(row).and_then(|r| r.get(col)))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value.into();
        }
    }

    /// Names from `required` that are not headers of this table.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }
}

/// Read any CSV file with a header row.
pub fn read_table(path: &Path) -> Result<CsvTable, ReportError> {
    let file = std::fs::File::open(path).map_err(|e| ReportError::io(path, e))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut table = CsvTable::new(headers);

    for record in reader.records() {
        let record = record.map_err(|e| malformed_row(path, e))?;
        table.push_row(record.iter().map(String::from).collect());
    }
    Ok(table)
}

fn malformed_row(path: &Path, err: csv::Error) -> ReportError {
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => ReportError::MalformedRow {
            path: path.to_path_buf(),
            line: pos.as_ref().map(|p| p.line()).unwrap_or_default(),
            expected: *expected_len,
            found: *len,
        },
        _ => ReportError::Csv(err),
    }
}

/// Read a lookup input, rejecting files without `path`, `title` and `year`.
pub fn read_lookup_input(path: &Path) -> Result<CsvTable, ReportError> {
    let table = read_table(path)?;
    let missing = table.missing_columns(&REQUIRED_LOOKUP_COLUMNS);
    if !missing.is_empty() {
        return Err(ReportError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }
    Ok(table)
}

/// Write a table atomically.
pub fn write_table(path: &Path, table: &CsvTable) -> Result<(), ReportError> {
    write_atomically(path, |writer| {
        writer.write_record(table.headers())?;
        for row in table.rows() {
            writer.write_record(row)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_column_appends_once() {
        let mut table = CsvTable::new(vec!["path".into(), "title".into()]);
        table.push_row(vec!["/a".into(), "A".into()]);

        let idx = table.ensure_column("magnets");
        assert_eq!(idx, 2);
        assert_eq!(table.ensure_column("magnets"), 2);
        assert_eq!(table.ensure_column("title"), 1);
        assert_eq!(table.rows()[0], vec!["/a", "A", ""]);
    }

    #[test]
    fn test_get_and_set() {
        let mut table = CsvTable::new(vec!["path".into(), "title".into()]);
        table.push_row(vec!["/a".into()]);
        assert_eq!(table.get(0, "title"), "");
        assert_eq!(table.get(0, "nope"), "");

        table.set(0, 1, "Alien");
        assert_eq!(table.get(0, "title"), "Alien");
        table.set(5, 1, "ignored");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_read_write_preserves_extra_columns() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(
            &input,
            "path,title,year,note\n/a,\"Alien, Director's Cut\",1979,keep me\n/b,,,\n",
        )
        .unwrap();

        let table = read_lookup_input(&input).unwrap();
        assert_eq!(table.headers(), &["path", "title", "year", "note"]);
        assert_eq!(table.get(0, "title"), "Alien, Director's Cut");
        assert_eq!(table.get(1, "note"), "");

        let output = dir.path().join("out.csv");
        write_table(&output, &table).unwrap();
        assert_eq!(read_table(&output).unwrap(), table);
    }

    #[test]
    fn test_missing_columns_is_an_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "path,name\n/a,A\n").unwrap();

        match read_lookup_input(&input).unwrap_err() {
            ReportError::MissingColumns { missing, .. } => {
                assert_eq!(missing, vec!["title".to_string(), "year".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "path,title,year\n/a,Alien, Director's Cut,1979\n").unwrap();

        match read_lookup_input(&input).unwrap_err() {
            ReportError::MalformedRow {
                line,
                expected,
                found,
                ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 3);
                assert_eq!(found, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "path,title,year\n/a,Alien\n").unwrap();

        let err = read_table(&input).unwrap_err();
        assert!(matches!(err, ReportError::MalformedRow { found: 2, .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_table(&dir.path().join("none.csv")).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "old\n").unwrap();

        let mut table = CsvTable::new(vec!["path".into()]);
        table.push_row(vec!["/new".into()]);
        write_table(&path, &table).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "path\n/new\n");
    }
}
