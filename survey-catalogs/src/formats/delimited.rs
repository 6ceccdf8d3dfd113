//! Delimited text tables with a header row.
//!
//! Column types are inferred from the data: a column is integer if every
//! non-empty cell parses as one, else float if every non-empty cell parses as
//! a float, else string. Empty cells are null.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use super::{open_maybe_gz, FormatError};
use crate::catalogs::{CatalogTable, Column, ColumnData, ColumnType};

/// Read a delimited file whose first row holds column names.
pub fn read_delimited(path: &Path, delimiter: u8) -> Result<CatalogTable, FormatError> {
    log::debug!("Reading delimited table {}", path.display());
    let reader = open_maybe_gz(path)?;
    read_delimited_from(reader, delimiter)
}

pub fn read_delimited_from<R: Read>(reader: R, delimiter: u8) -> Result<CatalogTable, FormatError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(FormatError::MissingHeader);
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(FormatError::RaggedRow {
                line: index + 2,
                expected: headers.len(),
                found: record.len(),
            });
        }
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column::new(name, infer_column(raw)))
        .collect();
    Ok(CatalogTable::from_columns(columns)?)
}

fn infer_type(raw: &[String]) -> ColumnType {
    let mut present = raw.iter().filter(|s| !s.is_empty()).peekable();
    if present.peek().is_none() {
        return ColumnType::Float;
    }
    if present.clone().all(|s| s.parse::<i64>().is_ok()) {
        ColumnType::Int
    } else if present.all(|s| s.parse::<f64>().is_ok()) {
        ColumnType::Float
    } else {
        ColumnType::Str
    }
}

fn infer_column(raw: Vec<String>) -> ColumnData {
    match infer_type(&raw) {
        ColumnType::Int => ColumnData::Int(raw.iter().map(|s| s.parse().ok()).collect()),
        ColumnType::Float => ColumnData::Float(raw.iter().map(|s| s.parse().ok()).collect()),
        _ => ColumnData::Str(
            raw.into_iter()
                .map(|s| if s.is_empty() { None } else { Some(s) })
                .collect(),
        ),
    }
}
