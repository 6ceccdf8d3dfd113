//! Fixed-width ASCII tables described by a CDS `ReadMe`.
//!
//! Catalogs distributed through CDS ship a plain-text data file and a
//! `ReadMe` whose "Byte-by-byte Description" gives, for every column, its byte
//! range, Fortran-style format and label:
//!
//! ```text
//! Byte-by-byte Description of file: catalog.dat
//! --------------------------------------------------------------------------
//!    Bytes Format Units   Label     Explanations
//! --------------------------------------------------------------------------
//!    1- 16  A16   ---     2MASS     2MASS identifier
//!   18- 27  F10.6 deg     RA        ?=-9999.99 Right ascension (J2000)
//! --------------------------------------------------------------------------
//! ```
//!
//! A blank field is null. An explanation starting with `?=value` declares a
//! sentinel that is read as null too.

use std::io::BufRead;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use super::{open_maybe_gz, FormatError};
use crate::catalogs::{CatalogTable, Column, ColumnData, ColumnType};

lazy_static! {
    static ref COLUMN_LINE: Regex = Regex::new(
        r"^\s*(\d+)(?:\s*-\s*(\d+))?\s+([AIFED])(\d+)(?:\.\d+)?\s+(\S+)\s+(\S+)\s*(.*)$"
    )
    .expect("column line pattern is valid");
    static ref NULL_MARKER: Regex =
        Regex::new(r"^(?:\[[^\]]*\]\s*)?\?(?:=(\S*))?").expect("null marker pattern is valid");
}

const SECTION_PREFIX: &str = "Byte-by-byte Description of file:";

/// Lines indented past this are explanation continuations
const CONTINUATION_INDENT: usize = 10;

/// One column of a byte-by-byte description.
#[derive(Debug, Clone, PartialEq)]
pub struct CdsColumn {
    pub label: String,
    /// First byte, 1-based
    pub start: usize,
    /// Last byte, 1-based, inclusive
    pub end: usize,
    pub column_type: ColumnType,
    pub units: String,
    /// Explanation starts with `?`
    pub nullable: bool,
    /// Sentinel declared with `?=value`
    pub null_token: Option<String>,
}

impl CdsColumn {
    /// Whether a trimmed field holds this column's sentinel.
    fn is_sentinel(&self, field: &str) -> bool {
        let Some(token) = self.null_token.as_deref().filter(|t| !t.is_empty()) else {
            return false;
        };
        if field == token {
            return true;
        }
        match (field.parse::<f64>(), token.parse::<f64>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// Read `data_path` using the layout its `ReadMe` gives for it.
pub fn read_cds(data_path: &Path, readme_path: &Path) -> Result<CatalogTable, FormatError> {
    let readme = std::fs::read_to_string(readme_path)?;
    let file_name = data_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let columns = parse_readme(&readme, file_name)?;
    log::debug!(
        "ReadMe {} describes {} columns for {}",
        readme_path.display(),
        columns.len(),
        file_name
    );

    let reader = open_maybe_gz(data_path)?;
    read_cds_from(reader, &columns)
}

/// Column layout for `data_file` from the text of a `ReadMe`.
///
/// Sections are matched on file name, ignoring a `.gz` suffix and honoring
/// `*` wildcards. If the `ReadMe` has exactly one section it is used whatever
/// file it names.
pub fn parse_readme(readme: &str, data_file: &str) -> Result<Vec<CdsColumn>, FormatError> {
    let sections = parse_sections(readme)?;
    let wanted = strip_gz(data_file);

    let matching = sections
        .iter()
        .find(|(names, _)| names.iter().any(|name| name_matches(name, wanted)));

    match (matching, sections.len()) {
        (Some((_, columns)), _) => Ok(columns.clone()),
        (None, 1) => Ok(sections[0].1.clone()),
        _ => Err(FormatError::ReadmeSectionNotFound(data_file.to_string())),
    }
}

fn strip_gz(name: &str) -> &str {
    name.strip_suffix(".gz").unwrap_or(name)
}

fn name_matches(pattern: &str, file: &str) -> bool {
    let pattern = strip_gz(pattern);
    if !pattern.contains('*') {
        return pattern == file;
    }
    let expr = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{expr}$")).is_ok_and(|re| re.is_match(file))
}

type Section = (Vec<String>, Vec<CdsColumn>);

fn parse_sections(readme: &str) -> Result<Vec<Section>, FormatError> {
    let mut sections: Vec<Section> = Vec::new();
    // Dash rules seen in the open section: header above, header below, end
    let mut rules: Option<usize> = None;

    for (index, line) in readme.lines().enumerate() {
        let line = line.trim_end();

        if let Some(rest) = line.strip_prefix(SECTION_PREFIX) {
            let names = rest.split_whitespace().map(str::to_string).collect();
            sections.push((names, Vec::new()));
            rules = Some(0);
            continue;
        }

        let Some(seen) = rules.as_mut() else {
            continue;
        };

        if line.len() >= 10 && line.chars().all(|c| c == '-') {
            *seen += 1;
            if *seen == 3 {
                rules = None;
            }
            continue;
        }

        if *seen != 2 || line.trim().is_empty() {
            continue;
        }

        let indent = line.len() - line.trim_start().len();
        match parse_column_line(line) {
            Some(column) => {
                if let Some((_, columns)) = sections.last_mut() {
                    columns.push(column);
                }
            }
            None if indent > CONTINUATION_INDENT => {}
            None => {
                return Err(FormatError::InvalidReadmeLine {
                    line: index + 1,
                    text: line.to_string(),
                })
            }
        }
    }

    Ok(sections)
}

fn parse_column_line(line: &str) -> Option<CdsColumn> {
    let caps = COLUMN_LINE.captures(line)?;

    let start: usize = caps[1].parse().ok()?;
    let end: usize = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => start,
    };
    if start == 0 || end < start {
        return None;
    }

    let column_type = match &caps[3] {
        "A" => ColumnType::Str,
        "I" => ColumnType::Int,
        _ => ColumnType::Float,
    };

    let explanation = caps[7].trim();
    let (nullable, null_token) = match NULL_MARKER.captures(explanation) {
        Some(marker) => (true, marker.get(1).map(|m| m.as_str().to_string())),
        None => (false, None),
    };

    Some(CdsColumn {
        label: caps[6].to_string(),
        start,
        end,
        column_type,
        units: caps[5].to_string(),
        nullable,
        null_token,
    })
}

/// Parse fixed-width rows laid out as `columns` describes.
pub fn read_cds_from<R: BufRead>(reader: R, columns: &[CdsColumn]) -> Result<CatalogTable, FormatError> {
    let mut data: Vec<ColumnData> = columns
        .iter()
        .map(|c| ColumnData::empty(c.column_type))
        .collect();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let bytes = line.as_bytes();

        for (column, values) in columns.iter().zip(data.iter_mut()) {
            let from = (column.start - 1).min(bytes.len());
            let to = column.end.min(bytes.len());
            let field = String::from_utf8_lossy(&bytes[from..to]);
            let field = field.trim();
            let is_null = field.is_empty() || column.is_sentinel(field);

            let invalid = || FormatError::InvalidValue {
                line: index + 1,
                column: column.label.clone(),
                value: field.to_string(),
            };

            match values {
                ColumnData::Str(v) => v.push((!is_null).then(|| field.to_string())),
                ColumnData::Int(v) if is_null => v.push(None),
                ColumnData::Int(v) => v.push(Some(field.parse().map_err(|_| invalid())?)),
                ColumnData::Float(v) if is_null => v.push(None),
                ColumnData::Float(v) => v.push(Some(parse_float(field).ok_or_else(invalid)?)),
                ColumnData::Flag(v) => v.push(None),
            }
        }
    }

    let table = CatalogTable::from_columns(
        columns
            .iter()
            .zip(data)
            .map(|(c, values)| Column::new(c.label.clone(), values))
            .collect(),
    )?;
    Ok(table)
}

/// Fortran reals may use `D` exponents.
fn parse_float(field: &str) -> Option<f64> {
    field
        .parse::<f64>()
        .ok()
        .or_else(|| field.replace(['D', 'd'], "E").parse().ok())
}
