//! CSV/Excel parsing into normalized string tables.
//!
//! Source files carry no assumed header: the first row is promoted to column
//! names and dropped from the data, fully-empty rows are discarded, and every
//! remaining cell is kept as a string (empty cells become nulls).

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;

use crate::provider::DataError;

/// Input formats accepted by the ingestion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Excel,
}

impl SourceFormat {
    /// Detect the format from the file extension. Fails before any I/O for
    /// anything other than `.csv`, `.xls`, `.xlsx`.
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "xls" | "xlsx" => Ok(Self::Excel),
            _ => Err(DataError::UnsupportedExtension { extension }),
        }
    }
}

/// Parse a CSV or Excel symbol list into a normalized string-typed frame.
pub fn parse_source_file(path: &Path) -> Result<DataFrame, DataError> {
    let rows = match SourceFormat::from_path(path)? {
        SourceFormat::Csv => read_csv_rows(path)?,
        SourceFormat::Excel => read_excel_rows(path)?,
    };
    rows_to_frame(rows)
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<Option<String>>>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| DataError::IngestError(format!("open {}: {e}", path.display())))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| DataError::IngestError(format!("read {}: {e}", path.display())))?;
        rows.push(record.iter().map(normalize_cell).collect());
    }
    Ok(rows)
}

fn read_excel_rows(path: &Path) -> Result<Vec<Vec<Option<String>>>, DataError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| DataError::IngestError(format!("open {}: {e}", path.display())))?;

    // First worksheet only, matching the packaged symbol-list exports.
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            DataError::IngestError(format!("{}: workbook has no sheets", path.display()))
        })?
        .map_err(|e| DataError::IngestError(format!("read {}: {e}", path.display())))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn normalize_cell(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Render an Excel cell the way a string-typed read would: integral floats
/// drop the trailing `.0`.
fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => normalize_cell(s),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            Some(format!("{}", *f as i64))
        }
        other => Some(other.to_string()),
    }
}

/// Promote the first row to column names, drop fully-empty rows, and build
/// an all-string frame.
fn rows_to_frame(mut rows: Vec<Vec<Option<String>>>) -> Result<DataFrame, DataError> {
    if rows.is_empty() {
        return Err(DataError::IngestError("source file has no rows".into()));
    }

    let header = rows.remove(0);
    let names: Vec<String> = header
        .into_iter()
        .enumerate()
        .map(|(i, cell)| cell.unwrap_or_else(|| format!("column_{i}")))
        .collect();

    let data_rows: Vec<Vec<Option<String>>> = rows
        .into_iter()
        .filter(|row| row.iter().any(|c| c.is_some()))
        .collect();

    let columns: Vec<Column> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<Option<String>> = data_rows
                .iter()
                .map(|row| row.get(i).cloned().flatten())
                .collect();
            Column::new(name.as_str().into(), values)
        })
        .collect();

    DataFrame::new(columns)
        .map_err(|e| DataError::IngestError(format!("assemble frame: {e}")))
}
