//! Missing-value filling for continuous columns

use super::{ColumnRoles, TabularProc};
use crate::data::{ColumnData, Table};
use crate::error::{Result, TabError};
use serde::{Deserialize, Serialize};

/// Code of a `False` / `True` missing-value flag
const FLAG_FALSE: i64 = 1;
const FLAG_TRUE: i64 = 2;

/// Fills missing continuous values with the train median.
///
/// Every continuous column that had a missing value in the training rows
/// also gets a `{name}_na` flag column, registered as categorical with the
/// vocabulary `["#na#", "False", "True"]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FillMissing {
    fill_values: Vec<(String, f64)>,
    na_columns: Vec<String>,
    is_fitted: bool,
}

impl FillMissing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_value(&self, column: &str) -> Option<f64> {
        self.fill_values.iter().find(|(n, _)| n == column).map(|(_, v)| *v)
    }

    /// Continuous columns that get a missing-value flag
    pub fn na_columns(&self) -> &[String] {
        &self.na_columns
    }

    fn flag_name(column: &str) -> String {
        format!("{}_na", column)
    }
}

/// Median of the present values, 0.0 when there are none
fn median(values: &[Option<f64>]) -> f64 {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return 0.0;
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        (present[mid - 1] + present[mid]) / 2.0
    } else {
        present[mid]
    }
}

impl TabularProc for FillMissing {
    fn name(&self) -> &'static str {
        "FillMissing"
    }

    fn setup(&mut self, train: &Table, roles: &mut ColumnRoles) -> Result<()> {
        self.fill_values.clear();
        self.na_columns.clear();

        for name in &roles.cont_names {
            let values = train.numeric(name)?;
            self.fill_values.push((name.clone(), median(&values)));
            if values.iter().any(Option::is_none) {
                self.na_columns.push(name.clone());
            }
        }
        for name in &self.na_columns {
            roles.push_cat(Self::flag_name(name));
        }

        self.is_fitted = true;
        Ok(())
    }

    fn encode(&self, table: &Table) -> Result<Table> {
        if !self.is_fitted {
            return Err(TabError::NotFitted);
        }
        let mut result = table.clone();

        for name in &self.na_columns {
            let flags = table
                .column(name)?
                .numeric()
                .ok_or_else(|| TabError::SchemaError(format!("column '{}' is not numeric", name)))?
                .iter()
                .map(|v| Some(if v.is_none() { FLAG_TRUE } else { FLAG_FALSE }))
                .collect();
            result.with_column(Self::flag_name(name), ColumnData::Int(flags))?;
        }

        for (name, fill) in &self.fill_values {
            let values = table.numeric(name)?;
            let filled = values.into_iter().map(|v| Some(v.unwrap_or(*fill))).collect();
            result.with_column(name.clone(), ColumnData::Float(filled))?;
        }

        Ok(result)
    }

    fn state(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn cardinalities(&self) -> Vec<(String, usize)> {
        self.na_columns
            .iter()
            .map(|name| (Self::flag_name(name), 3))
            .collect()
    }
}
