//! Typed tabular data
//!
//! A [`Table`] is an ordered set of named, equally long columns. Every column
//! stores one of three value kinds with `None` as the missing value:
//! - `Int` - whole numbers
//! - `Float` - floating point numbers
//! - `Str` - text
//!
//! The pipeline only needs a handful of table operations: concatenation,
//! index selection, cardinality counts and column-wise transforms. CSV
//! parsing and writing goes through polars in [`loader`].

mod combine;
pub mod loader;

pub use combine::{combine, CombinedTable};
pub use loader::{read_csv, write_csv};

use crate::error::{Result, TabError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::ops::Range;

/// Kind of values stored in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Int,
    Float,
    Str,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Int => write!(f, "int"),
            ColumnKind::Float => write!(f, "float"),
            ColumnKind::Str => write!(f, "str"),
        }
    }
}

/// Values of a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
}

impl ColumnData {
    /// An all-missing column of the given kind
    pub fn nulls(kind: ColumnKind, len: usize) -> Self {
        match kind {
            ColumnKind::Int => ColumnData::Int(vec![None; len]),
            ColumnKind::Float => ColumnData::Float(vec![None; len]),
            ColumnKind::Str => ColumnData::Str(vec![None; len]),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Int(_) => ColumnKind::Int,
            ColumnData::Float(_) => ColumnKind::Float,
            ColumnData::Str(_) => ColumnKind::Str,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self {
            ColumnData::Int(v) => v[row].is_none(),
            ColumnData::Float(v) => v[row].is_none(),
            ColumnData::Str(v) => v[row].is_none(),
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Float(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Str(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Number of distinct values; a missing value counts as one value.
    pub fn n_unique(&self) -> usize {
        let has_null = usize::from(self.null_count() > 0);
        let distinct = match self {
            ColumnData::Int(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
            ColumnData::Float(v) => v
                .iter()
                .flatten()
                // -0.0 and 0.0 compare equal
                .map(|x| if *x == 0.0 { 0u64 } else { x.to_bits() })
                .collect::<HashSet<_>>()
                .len(),
            ColumnData::Str(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
        };
        distinct + has_null
    }

    /// Numeric view of the column, `None` for text columns
    pub fn numeric(&self) -> Option<Vec<Option<f64>>> {
        match self {
            ColumnData::Int(v) => Some(v.iter().map(|x| x.map(|i| i as f64)).collect()),
            ColumnData::Float(v) => Some(v.clone()),
            ColumnData::Str(_) => None,
        }
    }

    /// Widen an integer column to floats; other kinds are returned unchanged.
    pub fn into_float(self) -> Self {
        match self {
            ColumnData::Int(v) => ColumnData::Float(v.into_iter().map(|x| x.map(|i| i as f64)).collect()),
            other => other,
        }
    }

    /// Sorted distinct non-missing values rendered as text
    pub fn distinct_sorted(&self) -> Vec<String> {
        match self {
            ColumnData::Int(v) => v
                .iter()
                .flatten()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|x| x.to_string())
                .collect(),
            ColumnData::Float(v) => {
                let mut values: Vec<f64> = v.iter().flatten().copied().collect();
                values.sort_by(|a, b| a.total_cmp(b));
                values.dedup();
                values.into_iter().map(|x| x.to_string()).collect()
            }
            ColumnData::Str(v) => v
                .iter()
                .flatten()
                .map(|s| s.as_str())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Value at `row` rendered as text, `None` when missing
    pub fn key(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Int(v) => v[row].map(|x| x.to_string()),
            ColumnData::Float(v) => v[row].map(|x| x.to_string()),
            ColumnData::Str(v) => v[row].clone(),
        }
    }

    /// Rows at `indices`, in that order. Indices must be in bounds.
    fn take(&self, indices: &[usize]) -> Self {
        match self {
            ColumnData::Int(v) => ColumnData::Int(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Float(v) => ColumnData::Float(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Str(v) => ColumnData::Str(indices.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    fn append(&mut self, other: &ColumnData) -> Result<()> {
        match (self, other) {
            (ColumnData::Int(a), ColumnData::Int(b)) => a.extend_from_slice(b),
            (ColumnData::Float(a), ColumnData::Float(b)) => a.extend_from_slice(b),
            (ColumnData::Str(a), ColumnData::Str(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(TabError::SchemaError(format!(
                    "cannot append {} column to {} column",
                    b.kind(),
                    a.kind()
                )))
            }
        }
        Ok(())
    }
}

/// Ordered collection of named columns of equal length
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<ColumnData>,
    nrows: usize,
}

impl Table {
    /// Build a table, checking that names are unique and lengths agree
    pub fn new(columns: Vec<(String, ColumnData)>) -> Result<Self> {
        let nrows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut table = Self {
            names: Vec::with_capacity(columns.len()),
            columns: Vec::with_capacity(columns.len()),
            nrows,
        };
        for (name, data) in columns {
            if table.has_column(&name) {
                return Err(TabError::SchemaError(format!("duplicate column '{}'", name)));
            }
            if data.len() != nrows {
                return Err(TabError::ShapeError {
                    expected: format!("{} rows", nrows),
                    actual: format!("{} rows in column '{}'", data.len(), name),
                });
            }
            table.names.push(name);
            table.columns.push(data);
        }
        Ok(table)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterate over `(name, column)` pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnData)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn column(&self, name: &str) -> Result<&ColumnData> {
        self.position(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| TabError::ColumnNotFound(name.to_string()))
    }

    pub fn kind(&self, name: &str) -> Result<ColumnKind> {
        Ok(self.column(name)?.kind())
    }

    pub fn ints(&self, name: &str) -> Result<&[Option<i64>]> {
        match self.column(name)? {
            ColumnData::Int(v) => Ok(v),
            other => Err(kind_mismatch(name, ColumnKind::Int, other.kind())),
        }
    }

    pub fn floats(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.column(name)? {
            ColumnData::Float(v) => Ok(v),
            other => Err(kind_mismatch(name, ColumnKind::Float, other.kind())),
        }
    }

    pub fn strs(&self, name: &str) -> Result<&[Option<String>]> {
        match self.column(name)? {
            ColumnData::Str(v) => Ok(v),
            other => Err(kind_mismatch(name, ColumnKind::Str, other.kind())),
        }
    }

    /// Column values as floats; integer columns are widened, text is rejected
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.column(name)?;
        column
            .numeric()
            .ok_or_else(|| kind_mismatch(name, ColumnKind::Float, column.kind()))
    }

    /// Cardinality of a column (missing counts as one value)
    pub fn n_unique(&self, name: &str) -> Result<usize> {
        Ok(self.column(name)?.n_unique())
    }

    /// Select rows by position, in the given order
    pub fn take(&self, indices: &[usize]) -> Result<Table> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.nrows) {
            return Err(TabError::ShapeError {
                expected: format!("row index < {}", self.nrows),
                actual: bad.to_string(),
            });
        }
        Ok(Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            nrows: indices.len(),
        })
    }

    /// Contiguous block of rows
    pub fn slice(&self, range: Range<usize>) -> Result<Table> {
        if range.start > range.end || range.end > self.nrows {
            return Err(TabError::ShapeError {
                expected: format!("range within 0..{}", self.nrows),
                actual: format!("{}..{}", range.start, range.end),
            });
        }
        let indices: Vec<usize> = range.collect();
        self.take(&indices)
    }

    /// Append the rows of `other` below this table.
    ///
    /// Both tables must have the same column names, order and kinds.
    pub fn concat(&self, other: &Table) -> Result<Table> {
        if self.names != other.names {
            return Err(TabError::SchemaError(format!(
                "cannot concatenate tables with columns {:?} and {:?}",
                self.names, other.names
            )));
        }
        let mut columns = self.columns.clone();
        for ((name, column), tail) in self.names.iter().zip(columns.iter_mut()).zip(&other.columns) {
            column
                .append(tail)
                .map_err(|e| TabError::SchemaError(format!("column '{}': {}", name, e)))?;
        }
        Ok(Table {
            names: self.names.clone(),
            columns,
            nrows: self.nrows + other.nrows,
        })
    }

    /// Replace a column in place, or append it when the name is new
    pub fn with_column(&mut self, name: impl Into<String>, data: ColumnData) -> Result<&mut Self> {
        let name = name.into();
        if !self.columns.is_empty() && data.len() != self.nrows {
            return Err(TabError::ShapeError {
                expected: format!("{} rows", self.nrows),
                actual: format!("{} rows in column '{}'", data.len(), name),
            });
        }
        if self.columns.is_empty() {
            self.nrows = data.len();
        }
        match self.position(&name) {
            Some(i) => self.columns[i] = data,
            None => {
                self.names.push(name);
                self.columns.push(data);
            }
        }
        Ok(self)
    }

    /// Transform one column with `f`, keeping its position
    pub fn map_column<F>(&mut self, name: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&ColumnData) -> Result<ColumnData>,
    {
        let i = self
            .position(name)
            .ok_or_else(|| TabError::ColumnNotFound(name.to_string()))?;
        let mapped = f(&self.columns[i])?;
        if mapped.len() != self.nrows {
            return Err(TabError::ShapeError {
                expected: format!("{} rows", self.nrows),
                actual: format!("{} rows in column '{}'", mapped.len(), name),
            });
        }
        self.columns[i] = mapped;
        Ok(self)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

fn kind_mismatch(name: &str, expected: ColumnKind, actual: ColumnKind) -> TabError {
    TabError::SchemaError(format!(
        "column '{}' holds {} values, expected {}",
        name, actual, expected
    ))
}
