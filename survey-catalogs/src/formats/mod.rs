//! Readers for the file formats surveys publish their catalogs in.
//!
//! - [`fits`]: FITS binary tables, optionally gzipped
//! - [`cds`]: fixed-width ASCII tables described by a CDS `ReadMe`
//! - [`delimited`]: delimited text with a header row

pub mod cds;
pub mod delimited;
pub mod fits;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

use crate::catalogs::TableError;

/// Errors that can occur while parsing a catalog file
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FITS error: {0}")]
    Fits(String),

    #[error("HDU {0} not found")]
    HduNotFound(usize),

    #[error("HDU {index} is {found}, expected a table")]
    NotBinaryTable { index: usize, found: String },

    #[error("column '{column}' has unsupported type {kind}")]
    UnsupportedColumn { column: String, kind: String },

    #[error("no byte-by-byte description for '{0}' in ReadMe")]
    ReadmeSectionNotFound(String),

    #[error("ReadMe line {line}: cannot parse column description '{text}'")]
    InvalidReadmeLine { line: usize, text: String },

    #[error("line {line}, column '{column}': cannot parse '{value}'")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },

    #[error("file has no header row")]
    MissingHeader,

    #[error("row {line} has {found} fields, header has {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Open a file for buffered reading, decompressing `.gz` files on the fly.
pub fn open_maybe_gz(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        log::debug!("Decompressing {} while reading", path.display());
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub(crate) fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
