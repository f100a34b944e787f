//! Loosely-typed table handed over by the PDF table-extraction backend.

use pesalens_core::{Error, Result};
use std::io::Read;
use std::path::Path;

/// An extracted statement table. Column names are kept exactly as the
/// backend produced them (arbitrary case, stray spaces, line breaks,
/// duplicates). Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Build a table from string cells; blank cells become `None`.
    pub fn from_strings<S: AsRef<str>>(columns: &[S], rows: &[Vec<S>]) -> Self {
        Self::new(
            columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|cell| cell_value(cell.as_ref())).collect())
                .collect(),
        )
    }

    /// Read a CSV export of an extracted table. The first record is the
    /// header row. Ragged rows are accepted; missing cells read as `None`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| Error::DataCleaning(format!("reading header row: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record =
                result.map_err(|e| Error::DataCleaning(format!("reading row {}: {e}", i + 1)))?;
            rows.push(record.iter().map(cell_value).collect());
        }

        Ok(Self::new(columns, rows))
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// True if the table has no columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Cell at (`row`, `col`); `None` when blank or past the end of a short row.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

fn cell_value(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}
