//! Submission file writing

use crate::data::{write_csv, ColumnData, Table};
use crate::error::{Result, TabError};
use ndarray::Array1;
use std::path::Path;
use tracing::info;

/// Overwrite the `target` column of `template` with `preds`, row by row.
///
/// The template keeps its row order and every other column; nothing is
/// sorted or joined on a key.
pub fn fill_submission(template: &Table, preds: &Array1<f64>, target: &str) -> Result<Table> {
    if template.nrows() != preds.len() {
        return Err(TabError::SchemaError(format!(
            "submission template has {} rows but there are {} predictions",
            template.nrows(),
            preds.len()
        )));
    }
    if !template.has_column(target) {
        return Err(TabError::SchemaError(format!(
            "submission template has no '{}' column",
            target
        )));
    }

    let mut filled = template.clone();
    filled.with_column(target, ColumnData::Float(preds.iter().map(|&p| Some(p)).collect()))?;
    Ok(filled)
}

/// Fill the template and write it to `path` without an index column
pub fn write_submission(
    template: &Table,
    preds: &Array1<f64>,
    target: &str,
    path: impl AsRef<Path>,
) -> Result<Table> {
    let path = path.as_ref();
    let filled = fill_submission(template, preds, target)?;
    write_csv(&filled, path)?;
    info!(path = %path.display(), rows = filled.nrows(), "Wrote submission");
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::read_csv;
    use ndarray::array;

    fn template() -> Table {
        Table::new(vec![
            ("id".to_string(), ColumnData::Int(vec![Some(12), Some(10), Some(11)])),
            ("cost".to_string(), ColumnData::Int(vec![Some(0), Some(0), Some(0)])),
        ])
        .unwrap()
    }

    #[test]
    fn test_positional_overwrite() {
        let filled = fill_submission(&template(), &array![1.5, 2.5, 3.5], "cost").unwrap();
        assert_eq!(filled.ints("id").unwrap(), &[Some(12), Some(10), Some(11)]);
        assert_eq!(filled.floats("cost").unwrap(), &[Some(1.5), Some(2.5), Some(3.5)]);
        assert_eq!(filled.column_names(), &["id".to_string(), "cost".to_string()]);
    }

    #[test]
    fn test_length_mismatch() {
        let result = fill_submission(&template(), &array![1.0, 2.0], "cost");
        assert!(matches!(result, Err(TabError::SchemaError(_))));
    }

    #[test]
    fn test_missing_target_column() {
        let result = fill_submission(&template(), &array![1.0, 2.0, 3.0], "price");
        assert!(matches!(result, Err(TabError::SchemaError(_))));
    }

    #[test]
    fn test_write_has_no_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.csv");
        write_submission(&template(), &array![1.5, 2.5, 3.5], "cost", &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("id,cost\n"));
        let back = read_csv(&path).unwrap();
        assert_eq!(back.ncols(), 2);
        assert_eq!(back.ints("id").unwrap(), &[Some(12), Some(10), Some(11)]);
    }
}
