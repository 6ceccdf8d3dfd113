//! Row-wise stacking of per-file tables.

use super::table::{CatalogTable, Column, ColumnData, ColumnType, TableError};

/// Stack tables vertically, preserving input order.
///
/// The result carries the union of all columns in first-seen order. Columns
/// whose type differs between inputs are widened to the common numeric type;
/// a column absent from one input is masked for that input's rows. Mixing a
/// string column with a numeric one is an error.
pub fn concat_tables(tables: Vec<CatalogTable>) -> Result<CatalogTable, TableError> {
    if tables.len() == 1 {
        return Ok(tables.into_iter().next().unwrap_or_default());
    }

    // Column layout of the result: name and widest type, first-seen order
    let mut layout: Vec<(String, ColumnType)> = Vec::new();
    for table in &tables {
        for column in table.columns() {
            match layout.iter_mut().find(|(name, _)| name == column.name()) {
                Some((name, column_type)) => {
                    *column_type = column_type.common(column.column_type()).ok_or_else(|| {
                        TableError::IncompatibleTypes {
                            column: name.clone(),
                            left: *column_type,
                            right: column.column_type(),
                        }
                    })?;
                }
                None => layout.push((column.name().to_string(), column.column_type())),
            }
        }
    }

    let mut merged: Vec<ColumnData> = layout
        .iter()
        .map(|(_, column_type)| ColumnData::empty(*column_type))
        .collect();

    for table in tables {
        let rows = table.num_rows();
        let mut columns: Vec<Option<Column>> = table.into_columns().into_iter().map(Some).collect();

        for ((name, column_type), target) in layout.iter().zip(merged.iter_mut()) {
            let found = columns
                .iter_mut()
                .find(|c| c.as_ref().is_some_and(|c| c.name() == name))
                .and_then(Option::take);

            match found {
                Some(column) => {
                    let found_type = column.column_type();
                    let widened = column.into_data().widen(*column_type).ok_or_else(|| {
                        TableError::IncompatibleTypes {
                            column: name.clone(),
                            left: *column_type,
                            right: found_type,
                        }
                    })?;
                    target.append(widened);
                }
                None => target.push_nulls(rows),
            }
        }
    }

    CatalogTable::from_columns(
        layout
            .into_iter()
            .zip(merged)
            .map(|((name, _), data)| Column::new(name, data))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::table::Value;

    fn table(columns: Vec<(&str, ColumnData)>) -> CatalogTable {
        CatalogTable::from_columns(
            columns
                .into_iter()
                .map(|(name, data)| Column::new(name, data))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_concat_preserves_order_and_counts() {
        let a = table(vec![("x", ColumnData::Int(vec![Some(1), Some(2)]))]);
        let b = table(vec![("x", ColumnData::Int(vec![Some(3)]))]);
        let c = table(vec![("x", ColumnData::Int(vec![Some(4), Some(5), Some(6)]))]);

        let merged = concat_tables(vec![a, b, c]).unwrap();
        assert_eq!(merged.num_rows(), 6);
        assert_eq!(
            merged.column("x").unwrap().as_ints().unwrap(),
            &[Some(1), Some(2), Some(3), Some(4), Some(5), Some(6)]
        );
    }

    #[test]
    fn test_concat_widens_int_to_float() {
        let a = table(vec![("parallax", ColumnData::Int(vec![Some(1)]))]);
        let b = table(vec![("parallax", ColumnData::Float(vec![Some(2.5)]))]);

        let merged = concat_tables(vec![a, b]).unwrap();
        let column = merged.column("parallax").unwrap();
        assert_eq!(column.column_type(), ColumnType::Float);
        assert_eq!(column.as_floats().unwrap(), &[Some(1.0), Some(2.5)]);
    }

    #[test]
    fn test_concat_masks_missing_columns() {
        let a = table(vec![
            ("id", ColumnData::Int(vec![Some(1)])),
            ("flag", ColumnData::Flag(vec![Some(true)])),
        ]);
        let b = table(vec![
            ("id", ColumnData::Int(vec![Some(2), Some(3)])),
            ("note", ColumnData::Str(vec![Some("x".into()), None])),
        ]);

        let merged = concat_tables(vec![a, b]).unwrap();
        assert_eq!(
            merged.column_names().collect::<Vec<_>>(),
            vec!["id", "flag", "note"]
        );
        assert_eq!(merged.num_rows(), 3);
        assert_eq!(merged.value(0, "note"), Some(Value::Null));
        assert_eq!(merged.value(1, "note"), Some(Value::Str("x")));
        assert_eq!(merged.value(2, "flag"), Some(Value::Null));
    }

    #[test]
    fn test_concat_rejects_string_numeric_mix() {
        let a = table(vec![("x", ColumnData::Str(vec![Some("a".into())]))]);
        let b = table(vec![("x", ColumnData::Float(vec![Some(1.0)]))]);

        let err = concat_tables(vec![a, b]).unwrap_err();
        assert_eq!(
            err,
            TableError::IncompatibleTypes {
                column: "x".into(),
                left: ColumnType::Str,
                right: ColumnType::Float
            }
        );
    }

    #[test]
    fn test_concat_empty_and_single() {
        assert_eq!(concat_tables(vec![]).unwrap().num_rows(), 0);

        let a = table(vec![("x", ColumnData::Int(vec![Some(1)]))]);
        assert_eq!(concat_tables(vec![a.clone()]).unwrap(), a);
    }
}
