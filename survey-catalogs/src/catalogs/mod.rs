//! Catalog tables module
//!
//! Every survey loader returns the same column-oriented [`CatalogTable`],
//! whatever the on-disk format was.

mod concat;
pub mod table;

pub use concat::concat_tables;
pub use table::{CatalogTable, Column, ColumnData, ColumnType, TableError, Value};
