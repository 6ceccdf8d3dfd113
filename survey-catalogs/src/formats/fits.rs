//! FITS binary table reader
//!
//! Reads one table extension into a [`CatalogTable`] through `fitsio`.
//! Gzipped files are inflated into a scratch file first, since FITS access is
//! random rather than streamed.
//!
//! Scalar numeric and string columns are supported. Integer cells equal to the
//! column's `TNULLn` and NaN float cells are null. Vector, logical, bit and
//! complex columns are rejected.

use std::io::{self, Write};
use std::path::Path;

use fitsio::compat::hdu::{FitsHdu, HduInfo};
use fitsio::compat::tables::{ColumnDataType, ConcreteColumnDescription};
use fitsio::compat::fitsfile::FitsFile;

use super::{is_gzipped, open_maybe_gz, FormatError};
use crate::catalogs::{CatalogTable, Column, ColumnData};

/// Read the binary table in extension `hdu` (1 = first extension).
pub fn read_bintable(path: &Path, hdu: usize) -> Result<CatalogTable, FormatError> {
    if !is_gzipped(path) {
        return read_hdu(path, hdu);
    }

    log::debug!("Inflating {} before reading", path.display());
    let mut staged = tempfile::Builder::new()
        .prefix("survey-catalogs-")
        .suffix(".fits")
        .tempfile()?;
    io::copy(&mut open_maybe_gz(path)?, staged.as_file_mut())?;
    staged.as_file_mut().flush()?;
    read_hdu(staged.path(), hdu)
}

fn read_hdu(path: &Path, index: usize) -> Result<CatalogTable, FormatError> {
    log::debug!("Reading FITS HDU {} from {}", index, path.display());
    let mut fits = FitsFile::open(path).map_err(fits_error)?;
    let hdu = fits.hdu(index).map_err(|_| FormatError::HduNotFound(index))?;

    let (descriptions, num_rows) = match &hdu.info {
        HduInfo::TableInfo {
            column_descriptions,
            num_rows,
        } => (column_descriptions.clone(), *num_rows),
        HduInfo::ImageInfo { .. } => {
            return Err(FormatError::NotBinaryTable {
                index,
                found: "IMAGE".to_string(),
            })
        }
        _ => {
            return Err(FormatError::NotBinaryTable {
                index,
                found: "unknown HDU".to_string(),
            })
        }
    };

    let mut columns = Vec::with_capacity(descriptions.len());
    for (position, description) in descriptions.iter().enumerate() {
        let data = if num_rows == 0 {
            empty_column(description)?
        } else {
            read_column(&mut fits, &hdu, position + 1, description)?
        };
        columns.push(Column::new(description.name.trim(), data));
    }

    log::debug!("Read FITS table with {} rows", num_rows);
    Ok(CatalogTable::from_columns(columns)?)
}

/// How a column is decoded into table cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Int,
    Float,
    Text,
}

fn cell_kind(description: &ConcreteColumnDescription) -> Result<CellKind, FormatError> {
    let data_type = &description.data_type;
    let kind = match data_type.typ {
        ColumnDataType::Byte
        | ColumnDataType::Short
        | ColumnDataType::Int
        | ColumnDataType::Long
        | ColumnDataType::LongLong => CellKind::Int,
        ColumnDataType::Float | ColumnDataType::Double => CellKind::Float,
        ColumnDataType::Text => CellKind::Text,
        _ => return Err(unsupported(description)),
    };
    if kind != CellKind::Text && data_type.repeat > 1 {
        return Err(unsupported(description));
    }
    Ok(kind)
}

fn unsupported(description: &ConcreteColumnDescription) -> FormatError {
    FormatError::UnsupportedColumn {
        column: description.name.clone(),
        kind: format!(
            "{}x {:?}",
            description.data_type.repeat, description.data_type.typ
        ),
    }
}

fn empty_column(description: &ConcreteColumnDescription) -> Result<ColumnData, FormatError> {
    Ok(match cell_kind(description)? {
        CellKind::Int => ColumnData::Int(Vec::new()),
        CellKind::Float => ColumnData::Float(Vec::new()),
        CellKind::Text => ColumnData::Str(Vec::new()),
    })
}

fn read_column(
    fits: &mut FitsFile,
    hdu: &FitsHdu,
    number: usize,
    description: &ConcreteColumnDescription,
) -> Result<ColumnData, FormatError> {
    let name = description.name.as_str();
    match cell_kind(description)? {
        CellKind::Int => {
            let null = hdu.read_key::<i64>(fits, &format!("TNULL{number}")).ok();
            let values: Vec<i64> = hdu.read_col(fits, name).map_err(fits_error)?;
            Ok(ColumnData::Int(
                values
                    .into_iter()
                    .map(|v| (Some(v) != null).then_some(v))
                    .collect(),
            ))
        }
        CellKind::Float => {
            let values: Vec<f64> = hdu.read_col(fits, name).map_err(fits_error)?;
            Ok(ColumnData::Float(
                values.into_iter().map(|v| (!v.is_nan()).then_some(v)).collect(),
            ))
        }
        CellKind::Text => {
            let values: Vec<String> = hdu.read_col(fits, name).map_err(fits_error)?;
            Ok(ColumnData::Str(
                values
                    .into_iter()
                    .map(|s| Some(s.trim_end_matches([' ', '\0']).to_string()))
                    .collect(),
            ))
        }
    }
}

fn fits_error(error: impl std::fmt::Display) -> FormatError {
    FormatError::Fits(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::Value;
    use approx::assert_relative_eq;
    use byteorder::{BigEndian, WriteBytesExt};

    const BLOCK_SIZE: usize = 2880;

    fn card(text: &str) -> Vec<u8> {
        format!("{text:<80}").into_bytes()
    }

    fn pad(bytes: &mut Vec<u8>, fill: u8) {
        let target = bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        bytes.resize(target, fill);
    }

    fn header_block(cards: &[String]) -> Vec<u8> {
        let mut bytes: Vec<u8> = cards.iter().flat_map(|c| card(c)).collect();
        bytes.extend(card("END"));
        pad(&mut bytes, b' ');
        bytes
    }

    fn primary() -> Vec<u8> {
        header_block(&[
            "SIMPLE  =                    T".to_string(),
            "BITPIX  =                    8".to_string(),
            "NAXIS   =                    0".to_string(),
            "EXTEND  =                    T".to_string(),
        ])
    }

    fn table_header(row_bytes: usize, rows: usize, fields: &[(&str, &str)]) -> Vec<String> {
        let mut cards = vec![
            "XTENSION= 'BINTABLE'           / binary table".to_string(),
            "BITPIX  =                    8".to_string(),
            "NAXIS   =                    2".to_string(),
            format!("NAXIS1  = {:>20}", row_bytes),
            format!("NAXIS2  = {:>20}", rows),
            "PCOUNT  =                    0".to_string(),
            "GCOUNT  =                    1".to_string(),
            format!("TFIELDS = {:>20}", fields.len()),
        ];
        for (i, (name, tform)) in fields.iter().enumerate() {
            cards.push(format!("TTYPE{:<3}= '{}'", i + 1, name));
            cards.push(format!("TFORM{:<3}= '{}'", i + 1, tform));
        }
        cards
    }

    /// BINTABLE with columns ID (J, TNULL -1), MAG (E), NAME (6A)
    fn star_table() -> Vec<u8> {
        let rows: [(i32, f32, &str); 3] = [
            (10, 11.5, "alpha"),
            (-1, 12.25, "beta"),
            (30, f32::NAN, "gamma"),
        ];
        let fields = [("ID", "J"), ("MAG", "E"), ("NAME", "6A")];
        let mut cards = table_header(14, rows.len(), &fields);
        cards.push("TNULL1  =                   -1".to_string());

        let mut bytes = primary();
        bytes.extend(header_block(&cards));
        let mut data = Vec::new();
        for (id, mag, name) in rows {
            data.write_i32::<BigEndian>(id).unwrap();
            data.write_f32::<BigEndian>(mag).unwrap();
            let mut text = name.as_bytes().to_vec();
            text.resize(6, b' ');
            data.extend(text);
        }
        pad(&mut data, 0);
        bytes.extend(data);
        bytes
    }

    fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_read_star_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "stars.fits", &star_table());
        let table = read_bintable(&path, 1).unwrap();

        assert_eq!(table.num_rows(), 3);
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["ID", "MAG", "NAME"]
        );
        assert_eq!(
            table.column("ID").unwrap().as_ints().unwrap(),
            &[Some(10), None, Some(30)]
        );
        assert_relative_eq!(table.value(1, "MAG").unwrap().as_f64().unwrap(), 12.25);
        assert_eq!(table.value(2, "MAG"), Some(Value::Null));
        assert_eq!(table.value(0, "NAME"), Some(Value::Str("alpha")));
    }

    #[test]
    fn test_read_gzipped_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stars.fits.gz");
        let mut encoder = GzEncoder::new(
            std::fs::File::create(&path).unwrap(),
            Compression::default(),
        );
        encoder.write_all(&star_table()).unwrap();
        encoder.finish().unwrap();

        let table = read_bintable(&path, 1).unwrap();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.value(2, "ID"), Some(Value::Int(30)));
    }

    #[test]
    fn test_large_long_values_survive() {
        let mut bytes = primary();
        bytes.extend(header_block(&table_header(8, 2, &[("SOURCE_ID", "K")])));
        let mut data = Vec::new();
        data.write_i64::<BigEndian>(i64::MAX).unwrap();
        data.write_i64::<BigEndian>(6_917_528_997_577_384_320).unwrap();
        pad(&mut data, 0);
        bytes.extend(data);

        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "ids.fits", &bytes);
        let table = read_bintable(&path, 1).unwrap();
        assert_eq!(
            table.column("SOURCE_ID").unwrap().as_ints().unwrap(),
            &[Some(i64::MAX), Some(6_917_528_997_577_384_320)]
        );
    }

    #[test]
    fn test_missing_hdu() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "stars.fits", &star_table());
        let err = read_bintable(&path, 2).unwrap_err();
        assert!(matches!(err, FormatError::HduNotFound(2)));
    }

    #[test]
    fn test_primary_is_not_a_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "stars.fits", &star_table());
        let err = read_bintable(&path, 0).unwrap_err();
        assert!(matches!(err, FormatError::NotBinaryTable { index: 0, .. }));
    }

    #[test]
    fn test_not_fits_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "junk.fits", b"this is not a FITS file at all");
        assert!(read_bintable(&path, 1).is_err());
    }

    #[test]
    fn test_vector_column_rejected() {
        let mut bytes = primary();
        bytes.extend(header_block(&table_header(4, 1, &[("PM", "2I")])));
        let mut data = Vec::new();
        data.write_i16::<BigEndian>(7).unwrap();
        data.write_i16::<BigEndian>(-8).unwrap();
        pad(&mut data, 0);
        bytes.extend(data);

        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "pm.fits", &bytes);
        let err = read_bintable(&path, 1).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedColumn { ref column, .. } if column == "PM"));
    }
}
