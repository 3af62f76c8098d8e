//! Train/test combination with row provenance

use super::{ColumnData, ColumnKind, Table};
use crate::error::{Result, TabError};
use std::ops::Range;
use tracing::debug;

/// Train and test rows stacked into one table.
///
/// Rows `train_idxs` came from the train table and rows `test_idxs` from the
/// test table, each in their original order.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTable {
    table: Table,
    train_idxs: Range<usize>,
    test_idxs: Range<usize>,
}

impl CombinedTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn train_idxs(&self) -> Range<usize> {
        self.train_idxs.clone()
    }

    pub fn test_idxs(&self) -> Range<usize> {
        self.test_idxs.clone()
    }

    pub fn n_train(&self) -> usize {
        self.train_idxs.len()
    }

    pub fn n_test(&self) -> usize {
        self.test_idxs.len()
    }

    /// Train-origin rows, in their original order
    pub fn train(&self) -> Result<Table> {
        self.table.slice(self.train_idxs())
    }

    /// Test-origin rows, in their original order
    pub fn test(&self) -> Result<Table> {
        self.table.slice(self.test_idxs())
    }
}

/// Stack `test` below `train`.
///
/// Column order follows `train`. The `target` column may be absent from
/// `test`, in which case its test rows are missing. Any other column present
/// in only one of the tables is a schema error. Integer and float columns
/// are unified to floats; mixing text with numbers is a schema error.
pub fn combine(train: &Table, test: &Table, target: &str) -> Result<CombinedTable> {
    if let Some(extra) = test
        .column_names()
        .iter()
        .find(|name| !train.has_column(name))
    {
        return Err(TabError::SchemaError(format!(
            "test column '{}' does not exist in train",
            extra
        )));
    }

    let mut columns = Vec::with_capacity(train.ncols());
    for (name, head) in train.iter() {
        let tail = match test.column(name) {
            Ok(column) => column.clone(),
            Err(_) if name == target => ColumnData::nulls(head.kind(), test.nrows()),
            Err(_) => {
                return Err(TabError::SchemaError(format!(
                    "train column '{}' is missing from test",
                    name
                )))
            }
        };
        let (head, tail) = unify(name, head.clone(), tail)?;
        columns.push((name.to_string(), head, tail));
    }

    let head = Table::new(columns.iter().map(|(n, h, _)| (n.clone(), h.clone())).collect())?;
    let tail = Table::new(columns.into_iter().map(|(n, _, t)| (n, t)).collect())?;
    let table = head.concat(&tail)?;

    let n_train = train.nrows();
    let n_total = n_train + test.nrows();
    debug!(n_train, n_test = test.nrows(), cols = table.ncols(), "Combined train and test");

    Ok(CombinedTable {
        table,
        train_idxs: 0..n_train,
        test_idxs: n_train..n_total,
    })
}

fn unify(name: &str, head: ColumnData, tail: ColumnData) -> Result<(ColumnData, ColumnData)> {
    let (hk, tk) = (head.kind(), tail.kind());
    if hk == tk {
        return Ok((head, tail));
    }
    // A side with no values at all adopts the other side's kind
    if tail.null_count() == tail.len() {
        return Ok((head, ColumnData::nulls(hk, tail.len())));
    }
    if head.null_count() == head.len() {
        return Ok((ColumnData::nulls(tk, head.len()), tail));
    }
    match (hk, tk) {
        (ColumnKind::Int, ColumnKind::Float) | (ColumnKind::Float, ColumnKind::Int) => {
            Ok((head.into_float(), tail.into_float()))
        }
        _ => Err(TabError::SchemaError(format!(
            "column '{}' is {} in train but {} in test",
            name, hk, tk
        ))),
    }
}
