//! Column-oriented catalog tables with nullable cells.

use std::fmt;

use thiserror::Error;

/// Errors raised while assembling or editing a table
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("column '{column}' has {found} rows, table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("no column named '{0}'")]
    MissingColumn(String),

    #[error("column '{column}' is {found}, expected a numeric column")]
    NotNumeric { column: String, found: ColumnType },

    #[error("column '{column}' cannot combine {left} with {right}")]
    IncompatibleTypes {
        column: String,
        left: ColumnType,
        right: ColumnType,
    },
}

/// Storage type of a column.
///
/// Numeric types are ordered by widening: a flag fits in an integer, an
/// integer fits in a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnType {
    Flag,
    Int,
    Float,
    Str,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnType::Str)
    }

    /// Smallest type both `self` and `other` widen to, if any.
    pub fn common(self, other: ColumnType) -> Option<ColumnType> {
        if self == other {
            Some(self)
        } else if self.is_numeric() && other.is_numeric() {
            Some(self.max(other))
        } else {
            None
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Flag => "flag",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Str => "string",
        };
        write!(f, "{name}")
    }
}

/// Typed cell storage; `None` marks a masked (absent) value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Flag(Vec<Option<bool>>),
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
}

impl ColumnData {
    /// Empty storage of the given type.
    pub fn empty(column_type: ColumnType) -> Self {
        Self::nulls(column_type, 0)
    }

    /// `len` masked cells of the given type.
    pub fn nulls(column_type: ColumnType, len: usize) -> Self {
        match column_type {
            ColumnType::Flag => ColumnData::Flag(vec![None; len]),
            ColumnType::Int => ColumnData::Int(vec![None; len]),
            ColumnType::Float => ColumnData::Float(vec![None; len]),
            ColumnType::Str => ColumnData::Str(vec![None; len]),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Flag(_) => ColumnType::Flag,
            ColumnData::Int(_) => ColumnType::Int,
            ColumnData::Float(_) => ColumnType::Float,
            ColumnData::Str(_) => ColumnType::Str,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Flag(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnData::Flag(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Int(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Float(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Str(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// Convert to a wider type. Widening to the current type is a no-op;
    /// narrowing, or crossing between strings and numbers, returns `None`.
    pub fn widen(self, target: ColumnType) -> Option<ColumnData> {
        let current = self.column_type();
        if current == target {
            return Some(self);
        }
        if !(current.is_numeric() && target.is_numeric() && current < target) {
            return None;
        }

        let widened = match (self, target) {
            (ColumnData::Flag(v), ColumnType::Int) => {
                ColumnData::Int(v.into_iter().map(|c| c.map(i64::from)).collect())
            }
            (ColumnData::Flag(v), ColumnType::Float) => ColumnData::Float(
                v.into_iter()
                    .map(|c| c.map(|b| if b { 1.0 } else { 0.0 }))
                    .collect(),
            ),
            (ColumnData::Int(v), ColumnType::Float) => {
                ColumnData::Float(v.into_iter().map(|c| c.map(|i| i as f64)).collect())
            }
            _ => return None,
        };
        Some(widened)
    }

    /// Append `other`, which must have the same type.
    pub(crate) fn append(&mut self, other: ColumnData) -> bool {
        match (self, other) {
            (ColumnData::Flag(a), ColumnData::Flag(b)) => a.extend(b),
            (ColumnData::Int(a), ColumnData::Int(b)) => a.extend(b),
            (ColumnData::Float(a), ColumnData::Float(b)) => a.extend(b),
            (ColumnData::Str(a), ColumnData::Str(b)) => a.extend(b),
            _ => return false,
        }
        true
    }

    pub(crate) fn push_nulls(&mut self, count: usize) {
        match self {
            ColumnData::Flag(v) => v.resize(v.len() + count, None),
            ColumnData::Int(v) => v.resize(v.len() + count, None),
            ColumnData::Float(v) => v.resize(v.len() + count, None),
            ColumnData::Str(v) => v.resize(v.len() + count, None),
        }
    }

    pub fn value(&self, row: usize) -> Option<Value<'_>> {
        let value = match self {
            ColumnData::Flag(v) => v.get(row)?.map(Value::Flag),
            ColumnData::Int(v) => v.get(row)?.map(Value::Int),
            ColumnData::Float(v) => v.get(row)?.map(Value::Float),
            ColumnData::Str(v) => v.get(row)?.as_deref().map(Value::Str),
        };
        Some(value.unwrap_or(Value::Null))
    }
}

/// A single cell, borrowed from its column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Null,
    Flag(bool),
    Int(i64),
    Float(f64),
    Str(&'a str),
}

impl Value<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell; strings and nulls have none.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Flag(b) => Some(if b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(i as f64),
            Value::Float(f) => Some(f),
            Value::Null | Value::Str(_) => None,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "--"),
            Value::Flag(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn value(&self, row: usize) -> Option<Value<'_>> {
        self.data.value(row)
    }

    pub fn as_floats(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[Option<i64>]> {
        match &self.data {
            ColumnData::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strs(&self) -> Option<&[Option<String>]> {
        match &self.data {
            ColumnData::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_flags(&self) -> Option<&[Option<bool>]> {
        match &self.data {
            ColumnData::Flag(v) => Some(v),
            _ => None,
        }
    }
}

/// An ordered set of equal-length named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogTable {
    columns: Vec<Column>,
    num_rows: usize,
}

impl CatalogTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, checking lengths and name uniqueness.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut table = Self::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Append a column. The first column fixes the row count.
    pub fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if self.column(column.name()).is_some() {
            return Err(TableError::DuplicateColumn(column.name.clone()));
        }
        if self.columns.is_empty() {
            self.num_rows = column.len();
        } else if column.len() != self.num_rows {
            return Err(TableError::LengthMismatch {
                column: column.name.clone(),
                expected: self.num_rows,
                found: column.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    /// Cell at (`row`, `name`), or `None` when either is out of range.
    pub fn value(&self, row: usize, name: &str) -> Option<Value<'_>> {
        self.column(name)?.value(row)
    }

    /// Replace every masked cell of a numeric column with `fill`.
    ///
    /// Integer and flag columns are widened to float first. Returns the number
    /// of cells filled.
    pub fn fill_nulls(&mut self, name: &str, fill: f64) -> Result<usize, TableError> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;

        let column_type = column.column_type();
        let not_numeric = || TableError::NotNumeric {
            column: name.to_string(),
            found: column_type,
        };
        if !column_type.is_numeric() {
            return Err(not_numeric());
        }

        let data = std::mem::replace(&mut column.data, ColumnData::empty(ColumnType::Float));
        let Some(ColumnData::Float(mut values)) = data.widen(ColumnType::Float) else {
            return Err(not_numeric());
        };

        let mut filled = 0;
        for cell in values.iter_mut().filter(|c| c.is_none()) {
            *cell = Some(fill);
            filled += 1;
        }
        column.data = ColumnData::Float(values);
        Ok(filled)
    }
}
