//! Column-addressable time-series tables loaded from simulator artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Cell separator declared by an artifact's producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    /// Exactly one tab between cells (dataframe-style `.tsv` outputs).
    Tab,
    /// Any run of spaces or tabs (plain-text ODE outputs).
    #[default]
    Whitespace,
}

/// Accumulates rows; the first row decides header vs. positional names.
struct RowSink {
    source: PathBuf,
    names: Option<Vec<String>>,
    has_header: bool,
    columns: Vec<Vec<f64>>,
}

impl RowSink {
    fn new(source: PathBuf) -> Self {
        Self {
            source,
            names: None,
            has_header: false,
            columns: Vec::new(),
        }
    }

    fn malformed(&self, line: usize, reason: String) -> Error {
        Error::MalformedArtifact {
            path: self.source.clone(),
            line,
            reason,
        }
    }

    fn push(&mut self, line: usize, cells: &[&str]) -> Result<()> {
        if self.names.is_none() {
            if cells.iter().any(|c| c.parse::<f64>().is_err()) {
                if let Some(pos) = cells.iter().position(|c| c.is_empty()) {
                    return Err(self.malformed(line, format!("empty header cell {}", pos)));
                }
                self.names = Some(cells.iter().map(|c| c.to_string()).collect());
                self.has_header = true;
                self.columns = vec![Vec::new(); cells.len()];
                return Ok(());
            }
            self.names = Some((0..cells.len()).map(|c| format!("c{}", c)).collect());
            self.columns = vec![Vec::new(); cells.len()];
        }

        if cells.len() != self.columns.len() {
            return Err(self.malformed(
                line,
                format!("expected {} cells, found {}", self.columns.len(), cells.len()),
            ));
        }
        for (i, cell) in cells.iter().enumerate() {
            let value = cell
                .parse::<f64>()
                .map_err(|_| self.malformed(line, format!("non-numeric cell '{}'", cell)))?;
            self.columns[i].push(value);
        }
        Ok(())
    }

    fn finish(self) -> Result<Table> {
        let Some(names) = self.names else {
            return Err(self.malformed(0, "artifact is empty".to_string()));
        };
        Ok(Table {
            names,
            columns: self.columns,
            has_header: self.has_header,
            source: self.source,
        })
    }
}

/// In-memory time-series table.
///
/// Data is stored column-major; column order is the artifact's order and is
/// the canonical body ordering for everything downstream.
#[derive(Debug, Clone)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    has_header: bool,
    source: PathBuf,
}

impl Table {
    /// Load a table from disk.
    ///
    /// A missing file is reported as [`Error::MissingArtifact`] so callers can
    /// decide whether to skip the series or abort.
    pub fn load<P: AsRef<Path>>(path: P, delimiter: Delimiter) -> Result<Self> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::MissingArtifact {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(Error::io(path, e)),
        };
        let table = Self::parse(&text, delimiter, path)?;
        log::debug!(
            "Loaded {}: {} rows x {} columns",
            path.display(),
            table.row_count(),
            table.column_count()
        );
        Ok(table)
    }

    /// Parse artifact text. `source` is only used for error reporting.
    pub fn parse<P: AsRef<Path>>(text: &str, delimiter: Delimiter, source: P) -> Result<Self> {
        let mut sink = RowSink::new(source.as_ref().to_path_buf());
        match delimiter {
            Delimiter::Tab => Self::parse_tab(text, &mut sink)?,
            Delimiter::Whitespace => Self::parse_whitespace(text, &mut sink)?,
        }
        sink.finish()
    }

    /// Tab-separated records via `csv`; blank and `#` lines are skipped.
    fn parse_tab(text: &str, sink: &mut RowSink) -> Result<()> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(false)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        for record in reader.records() {
            let record = record.map_err(|e| csv_malformed(&sink.source, e))?;
            let line = record.position().map_or(0, |p| p.line() as usize);
            let cells: Vec<&str> = record.iter().collect();
            sink.push(line, &cells)?;
        }
        Ok(())
    }

    /// Runs of blanks and tabs separate cells, which `csv` cannot express.
    fn parse_whitespace(text: &str, sink: &mut RowSink) -> Result<()> {
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let cells: Vec<&str> = line.split_whitespace().collect();
            sink.push(i + 1, &cells)?;
        }
        Ok(())
    }

    /// Build a table directly from named columns.
    ///
    /// All columns must have equal length.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self> {
        let (names, columns): (Vec<String>, Vec<Vec<f64>>) =
            columns.into_iter().map(|(n, c)| (n.into(), c)).unzip();
        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().position(|c| c.len() != first.len()) {
                return Err(Error::MalformedArtifact {
                    path: PathBuf::from("<memory>"),
                    line: 0,
                    reason: format!("column '{}' has mismatched length", names[bad]),
                });
            }
        }
        Ok(Self {
            names,
            columns,
            has_header: true,
            source: PathBuf::from("<memory>"),
        })
    }

    /// Column names in artifact order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Column values by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_index(name).map(|i| self.columns[i].as_slice())
    }

    /// Column values by position.
    pub fn column_at(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Single cell; `None` if either index is out of range.
    #[inline]
    pub fn value(&self, column: usize, row: usize) -> Option<f64> {
        self.columns.get(column)?.get(row).copied()
    }

    /// One row as a vector of values in column order.
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| c[row]).collect())
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    /// Whether the artifact carried a header row.
    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Path the table was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

fn csv_malformed(source: &Path, e: csv::Error) -> Error {
    let line = e.position().map_or(0, |p| p.line() as usize);
    let reason = match e.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {} cells, found {}", expected_len, len),
        _ => e.to_string(),
    };
    Error::MalformedArtifact {
        path: source.to_path_buf(),
        line,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_tab_with_header() {
        let text = "t\tx0\ty0\n0.0\t1.0\t0.0\n0.01\t0.99\t-0.1\n";
        let table = Table::parse(text, Delimiter::Tab, "chain.tsv").unwrap();

        assert!(table.has_header());
        assert_eq!(table.column_names(), &["t", "x0", "y0"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("x0").unwrap(), &[1.0, 0.99]);
        assert_eq!(table.value(2, 1), Some(-0.1));
        assert_eq!(table.row(0).unwrap(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_parse_whitespace_without_header() {
        // Mixed spacing as written by the plain-text ODE outputs
        let text = "0  1 0\n0.1  0.995 -0.0998\n";
        let table = Table::parse(text, Delimiter::Whitespace, "out.txt").unwrap();

        assert!(!table.has_header());
        assert_eq!(table.column_names(), &["c0", "c1", "c2"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_at(1).unwrap(), &[1.0, 0.995]);
    }

    #[test]
    fn test_parse_tab_trailing_space_in_cell() {
        let text = "0\t1\t 0\n";
        let table = Table::parse(text, Delimiter::Tab, "ms.tsv").unwrap();
        assert_eq!(table.column_at(2).unwrap(), &[0.0]);
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        let text = "t\tx0\ty0\n0\t1\t0\n0.1\t1\n";
        let err = Table::parse(text, Delimiter::Tab, "bad.tsv").unwrap_err();
        match err {
            Error::MalformedArtifact { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tab_skips_comments_and_blank_lines() {
        let text = "# chain run\r\nt\tx0\ty0\r\n\r\n0\t1\t0\r\n# checkpoint\r\n0.1\t0.9\t-0.1\r\n";
        let table = Table::parse(text, Delimiter::Tab, "chain.tsv").unwrap();
        assert_eq!(table.column_names(), &["t", "x0", "y0"]);
        assert_eq!(table.column("y0").unwrap(), &[0.0, -0.1]);
    }

    #[test]
    fn test_tab_ragged_row_reports_artifact_line() {
        let text = "t\tx0\n\n0\t1\n0.1\t1\t7\n";
        match Table::parse(text, Delimiter::Tab, "bad.tsv").unwrap_err() {
            Error::MalformedArtifact { line, reason, .. } => {
                assert_eq!(line, 4);
                assert_eq!(reason, "expected 2 cells, found 3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_whitespace_skips_comments() {
        let text = "# steps y(0) y(1)\n0 1 0\n\n   \n0.1 0.9 -0.1\n";
        let table = Table::parse(text, Delimiter::Whitespace, "out.txt").unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_non_numeric_cell_is_malformed() {
        let text = "t\tx0\n0\tabc\n";
        assert!(matches!(
            Table::parse(text, Delimiter::Tab, "bad.tsv"),
            Err(Error::MalformedArtifact { line: 2, .. })
        ));
    }

    #[test]
    fn test_empty_artifact_is_malformed() {
        assert!(matches!(
            Table::parse("\n\n", Delimiter::Whitespace, "empty.txt"),
            Err(Error::MalformedArtifact { .. })
        ));
    }

    #[test]
    fn test_header_only_has_zero_rows() {
        let table = Table::parse("t\tx0\ty0\n", Delimiter::Tab, "h.tsv").unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_load_missing_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.tsv");

        let err = Table::load(&path, Delimiter::Tab).unwrap_err();
        assert!(err.is_missing_artifact());
        match err {
            Error::MissingArtifact { path: p } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pendulum.tsv");
        fs::write(&path, "t\tx0\ty0\tx1\ty1\tlam1\tlam2\n0\t1\t0\t2\t0\t0.5\t0.25\n").unwrap();

        let table = Table::load(&path, Delimiter::Tab).unwrap();
        assert_eq!(table.source(), path.as_path());
        assert_eq!(table.column("lam2").unwrap(), &[0.25]);
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        let result = Table::from_columns(vec![("t", vec![0.0, 1.0]), ("x0", vec![1.0])]);
        assert!(result.is_err());
    }
}
