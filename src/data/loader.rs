//! CSV loading and saving

use super::{ColumnData, Table};
use crate::error::{Result, TabError};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Read a headered, comma separated UTF-8 file into a [`Table`].
///
/// The schema is inferred from every row. A missing or unreadable path is a
/// `FileError`; rows polars cannot parse are a `ParseError`.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let start = Instant::now();

    if !path.is_file() {
        return Err(TabError::file(path, "no such file"));
    }
    let file = File::open(path).map_err(|e| TabError::file(path, e))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| TabError::parse(path, e))?;

    let table = from_frame(&df).map_err(|e| TabError::parse(path, e))?;
    debug!(
        path = %path.display(),
        rows = table.nrows(),
        cols = table.ncols(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded CSV"
    );
    Ok(table)
}

/// Write a table as CSV with a header row and no index column.
///
/// The file is first written next to `path` and then renamed over it, so a
/// failure never leaves a partially written file behind.
pub fn write_csv(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut df = to_frame(table)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".partial");
    let tmp = Path::new(&tmp_name);

    let written = File::create(tmp)
        .map_err(|e| TabError::file(tmp, e))
        .and_then(|mut file| {
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df)
                .map_err(|e| TabError::file(path, e))
        });
    if let Err(e) = written {
        let _ = fs::remove_file(tmp);
        return Err(e);
    }

    fs::rename(tmp, path).map_err(|e| {
        let _ = fs::remove_file(tmp);
        TabError::file(path, e)
    })
}

/// Convert a polars frame into a typed table.
///
/// Integer columns become `Int`, floating columns `Float`, an all-empty
/// column `Float` with every value missing, and everything else (strings,
/// booleans, dates) `Str`.
pub fn from_frame(df: &DataFrame) -> Result<Table> {
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name().to_string();
        let series = column.as_materialized_series();
        let dtype = series.dtype();

        let data = if dtype.is_integer() {
            let casted = series.cast(&DataType::Int64)?;
            ColumnData::Int(casted.i64()?.into_iter().collect())
        } else if dtype.is_float() {
            let casted = series.cast(&DataType::Float64)?;
            ColumnData::Float(casted.f64()?.into_iter().collect())
        } else if dtype == &DataType::Null || (!series.is_empty() && series.null_count() == series.len()) {
            // blank columns are inferred as text
            ColumnData::Float(vec![None; series.len()])
        } else {
            match dtype {
                DataType::Boolean => ColumnData::Str(
                    series
                        .bool()?
                        .into_iter()
                        .map(|v| v.map(|b| (if b { "True" } else { "False" }).to_string()))
                        .collect(),
                ),
                _ => {
                    let casted = series.cast(&DataType::String)?;
                    ColumnData::Str(
                        casted
                            .str()?
                            .into_iter()
                            .map(|v| v.map(str::to_string))
                            .collect(),
                    )
                }
            }
        };
        columns.push((name, data));
    }
    Table::new(columns)
}

/// Convert a typed table back into a polars frame
pub fn to_frame(table: &Table) -> Result<DataFrame> {
    let columns: Vec<Column> = table
        .iter()
        .map(|(name, data)| match data {
            ColumnData::Int(v) => Column::new(name.into(), v.as_slice()),
            ColumnData::Float(v) => Column::new(name.into(), v.as_slice()),
            ColumnData::Str(v) => Column::new(name.into(), v.as_slice()),
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}
