//! Fitted preprocessing over the train-origin rows

use super::{ColumnRoles, ProcKind, SplitAssignment, TabularProc};
use crate::data::Table;
use crate::error::{Result, TabError};
use crate::training::{TabDataLoader, TabDataLoaders};
use ndarray::{concatenate, Array1, Array2, Axis};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// Model-ready matrices for one set of rows
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSplit {
    cats: Array2<usize>,
    conts: Array2<f64>,
    ys: Option<Array1<f64>>,
}

impl ProcessedSplit {
    pub fn new(cats: Array2<usize>, conts: Array2<f64>, ys: Option<Array1<f64>>) -> Result<Self> {
        let n = cats.nrows();
        let ys_len = ys.as_ref().map(|y| y.len()).unwrap_or(n);
        if conts.nrows() != n || ys_len != n {
            return Err(TabError::ShapeError {
                expected: format!("{} rows", n),
                actual: format!("{} continuous rows, {} targets", conts.nrows(), ys_len),
            });
        }
        Ok(Self { cats, conts, ys })
    }

    /// Build matrices from an encoded table.
    ///
    /// Every categorical column must already hold codes below its
    /// cardinality and every continuous column must be free of gaps.
    fn from_table(
        table: &Table,
        roles: &ColumnRoles,
        cardinalities: &[usize],
        y_name: &str,
        require_y: bool,
    ) -> Result<Self> {
        let n = table.nrows();

        let mut cats = Array2::<usize>::zeros((n, roles.cat_names.len()));
        for (j, (name, &card)) in roles.cat_names.iter().zip(cardinalities).enumerate() {
            let codes = table.ints(name).map_err(|_| {
                TabError::SchemaError(format!(
                    "categorical column '{}' is not encoded; add Categorify to the procs",
                    name
                ))
            })?;
            for (i, code) in codes.iter().enumerate() {
                let code = code.unwrap_or(0);
                if code < 0 || code as usize >= card {
                    return Err(TabError::ShapeError {
                        expected: format!("code < {} in column '{}'", card, name),
                        actual: code.to_string(),
                    });
                }
                cats[[i, j]] = code as usize;
            }
        }

        let mut conts = Array2::<f64>::zeros((n, roles.cont_names.len()));
        for (j, name) in roles.cont_names.iter().enumerate() {
            for (i, value) in table.numeric(name)?.into_iter().enumerate() {
                conts[[i, j]] = value.ok_or_else(|| {
                    TabError::SchemaError(format!(
                        "continuous column '{}' has missing values; add FillMissing to the procs",
                        name
                    ))
                })?;
            }
        }

        let ys = match table.numeric(y_name) {
            Ok(values) if values.iter().all(Option::is_some) => {
                Some(values.into_iter().flatten().collect::<Array1<f64>>())
            }
            Ok(_) if require_y => {
                return Err(TabError::SchemaError(format!(
                    "target column '{}' has missing values in training rows",
                    y_name
                )))
            }
            Err(e) if require_y => return Err(e),
            _ => None,
        };

        Self::new(cats, conts, ys)
    }

    pub fn len(&self) -> usize {
        self.cats.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Category codes, one column per categorical feature
    pub fn cats(&self) -> &Array2<usize> {
        &self.cats
    }

    /// Normalised continuous features
    pub fn conts(&self) -> &Array2<f64> {
        &self.conts
    }

    pub fn ys(&self) -> Option<&Array1<f64>> {
        self.ys.as_ref()
    }

    /// Codes followed by continuous values, as one float matrix
    pub fn xs(&self) -> Result<Array2<f64>> {
        let cats = self.cats.mapv(|c| c as f64);
        Ok(concatenate(Axis(1), &[cats.view(), self.conts.view()])?)
    }

    /// Rows at `rows`, in that order
    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            cats: self.cats.select(Axis(0), rows),
            conts: self.conts.select(Axis(0), rows),
            ys: self.ys.as_ref().map(|y| y.select(Axis(0), rows)),
        }
    }
}

/// Procs fitted on the train subset plus the processed train and
/// validation rows.
///
/// Every proc `setup` receives only rows listed in `split.train`; the
/// validation rows and any later rows go through `encode` alone.
#[derive(Debug)]
pub struct TabularData {
    procs: Vec<Box<dyn TabularProc>>,
    roles: ColumnRoles,
    cardinalities: Vec<usize>,
    y_name: String,
    train: ProcessedSplit,
    valid: ProcessedSplit,
}

impl TabularData {
    /// Fit `procs` on the train rows of `table` and process both subsets.
    ///
    /// `table` must hold train-origin rows only; `split` indexes into it.
    pub fn new(
        table: &Table,
        roles: &ColumnRoles,
        y_name: &str,
        split: &SplitAssignment,
        procs: &[ProcKind],
    ) -> Result<Self> {
        let start = Instant::now();
        split.validate(table.nrows())?;
        if roles.contains(y_name) {
            return Err(TabError::SchemaError(format!(
                "target column '{}' cannot also be a feature",
                y_name
            )));
        }

        let mut roles = roles.clone();
        let mut fitted: Vec<Box<dyn TabularProc>> = Vec::with_capacity(procs.len());

        let mut train = table.take(&split.train)?;
        for kind in procs {
            let mut proc = kind.build();
            proc.setup(&train, &mut roles)?;
            train = proc.encode(&train)?;
            debug!(proc = proc.name(), rows = train.nrows(), "Fitted proc");
            fitted.push(proc);
        }

        let mut valid = table.take(&split.valid)?;
        for proc in &fitted {
            valid = proc.encode(&valid)?;
        }

        let cardinalities = Self::collect_cardinalities(&fitted, &roles)?;
        let train = ProcessedSplit::from_table(&train, &roles, &cardinalities, y_name, true)?;
        let valid = ProcessedSplit::from_table(&valid, &roles, &cardinalities, y_name, true)?;

        info!(
            train_rows = train.len(),
            valid_rows = valid.len(),
            n_cat = roles.cat_names.len(),
            n_cont = roles.cont_names.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Preprocessed training data"
        );

        Ok(Self {
            procs: fitted,
            roles,
            cardinalities,
            y_name: y_name.to_string(),
            train,
            valid,
        })
    }

    fn collect_cardinalities(procs: &[Box<dyn TabularProc>], roles: &ColumnRoles) -> Result<Vec<usize>> {
        // later procs win when two encode the same column
        let by_name: HashMap<String, usize> = procs
            .iter()
            .flat_map(|p| p.cardinalities())
            .collect();
        roles
            .cat_names
            .iter()
            .map(|name| {
                by_name.get(name).copied().ok_or_else(|| {
                    TabError::SchemaError(format!(
                        "categorical column '{}' is not encoded; add Categorify to the procs",
                        name
                    ))
                })
            })
            .collect()
    }

    /// Column roles after setup, including added missing-value flags
    pub fn roles(&self) -> &ColumnRoles {
        &self.roles
    }

    pub fn cat_names(&self) -> &[String] {
        &self.roles.cat_names
    }

    pub fn cont_names(&self) -> &[String] {
        &self.roles.cont_names
    }

    pub fn y_name(&self) -> &str {
        &self.y_name
    }

    /// Number of codes per categorical column, in `cat_names` order
    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    pub fn train(&self) -> &ProcessedSplit {
        &self.train
    }

    pub fn valid(&self) -> &ProcessedSplit {
        &self.valid
    }

    /// Fitted state of every proc, keyed by proc name
    pub fn fitted_state(&self) -> Result<Vec<(String, serde_json::Value)>> {
        self.procs
            .iter()
            .map(|p| Ok((p.name().to_string(), p.state()?)))
            .collect()
    }

    /// Apply the fitted procs to new rows without refitting.
    ///
    /// Targets are attached only when the target column is present and
    /// complete.
    pub fn process(&self, table: &Table) -> Result<ProcessedSplit> {
        let mut encoded = table.clone();
        for proc in &self.procs {
            encoded = proc.encode(&encoded)?;
        }
        ProcessedSplit::from_table(&encoded, &self.roles, &self.cardinalities, &self.y_name, false)
    }

    /// Shuffled train loader and ordered validation loader
    pub fn dataloaders(&self, batch_size: usize, seed: Option<u64>) -> Result<TabDataLoaders> {
        TabDataLoaders::new(
            TabDataLoader::new(self.train.clone(), batch_size, true, seed)?,
            TabDataLoader::new(self.valid.clone(), batch_size, false, seed)?,
            self.cardinalities.clone(),
            self.roles.cont_names.len(),
        )
    }

    /// Ordered loader over new rows, processed with the fitted procs
    pub fn test_dl(&self, table: &Table, batch_size: usize) -> Result<TabDataLoader> {
        TabDataLoader::new(self.process(table)?, batch_size, false, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnData;
    use crate::preprocessing::{cont_cat_split, RandomSplitter};

    const PROCS: [ProcKind; 3] = [ProcKind::Categorify, ProcKind::FillMissing, ProcKind::Normalize];

    fn table() -> Table {
        Table::new(vec![
            ("store".to_string(), ColumnData::Str(vec![
                Some("a".into()), Some("b".into()), Some("a".into()), Some("c".into()),
                Some("b".into()), Some("a".into()), None, Some("b".into()),
            ])),
            ("area".to_string(), ColumnData::Float(vec![
                Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0), Some(7.0), Some(8.0),
            ])),
            ("cost".to_string(), ColumnData::Float(vec![
                Some(10.0), Some(20.0), Some(30.0), Some(40.0), Some(50.0), Some(60.0), Some(70.0), Some(80.0),
            ])),
        ])
        .unwrap()
    }

    fn build(table: &Table, split: &SplitAssignment) -> TabularData {
        let roles = cont_cat_split(table, 1, "cost");
        TabularData::new(table, &roles, "cost", split, &PROCS).unwrap()
    }

    #[test]
    fn test_shapes_and_roles() {
        let t = table();
        let split = SplitAssignment::new(vec![0, 1, 2, 3, 4, 5], vec![6, 7]);
        let data = build(&t, &split);

        assert_eq!(data.cat_names(), &["store".to_string(), "area_na".to_string()]);
        assert_eq!(data.cont_names(), &["area".to_string()]);
        assert_eq!(data.cardinalities(), &[4, 3]);

        assert_eq!(data.train().cats().dim(), (6, 2));
        assert_eq!(data.train().conts().dim(), (6, 1));
        assert_eq!(data.valid().len(), 2);
        assert_eq!(data.train().ys().unwrap().len(), 6);
        assert_eq!(data.train().xs().unwrap().dim(), (6, 3));
    }

    #[test]
    fn test_train_conts_are_standardised() {
        let t = table();
        let split = SplitAssignment::new(vec![0, 1, 2, 3, 4, 5], vec![6, 7]);
        let data = build(&t, &split);
        let mean = data.train().conts().column(0).mean().unwrap();
        assert!(mean.abs() < 1e-9);
    }

    #[test]
    fn test_fitted_state_ignores_validation_rows() {
        let t = table();
        let split = RandomSplitter::new(0.25).with_random_state(5).split(t.nrows()).unwrap();
        let base = build(&t, &split);

        let mut changed = t.clone();
        changed
            .map_column("area", |c| {
                let mut values = c.numeric().unwrap();
                for &i in &split.valid {
                    values[i] = Some(1e6);
                }
                Ok(ColumnData::Float(values))
            })
            .unwrap();
        changed
            .map_column("store", |c| {
                let mut values = match c {
                    ColumnData::Str(v) => v.clone(),
                    _ => unreachable!(),
                };
                for &i in &split.valid {
                    values[i] = Some("zzz".into());
                }
                Ok(ColumnData::Str(values))
            })
            .unwrap();
        let other = build(&changed, &split);

        assert_eq!(base.fitted_state().unwrap(), other.fitted_state().unwrap());
        assert_eq!(base.train(), other.train());
        assert_ne!(base.valid(), other.valid());
    }

    #[test]
    fn test_process_new_rows_without_target() {
        let t = table();
        let split = SplitAssignment::new(vec![0, 1, 2, 3, 4, 5], vec![6, 7]);
        let data = build(&t, &split);

        let test = Table::new(vec![
            ("store".to_string(), ColumnData::Str(vec![Some("new".into()), Some("a".into())])),
            ("area".to_string(), ColumnData::Float(vec![None, Some(3.0)])),
            ("cost".to_string(), ColumnData::Float(vec![None, None])),
        ])
        .unwrap();
        let processed = data.process(&test).unwrap();
        assert!(processed.ys().is_none());
        assert_eq!(processed.cats()[[0, 0]], 0);
        assert_eq!(processed.cats()[[0, 1]], 2);
        assert_eq!(processed.cats()[[1, 1]], 1);
    }

    #[test]
    fn test_missing_target_in_train_rows_fails() {
        let mut t = table();
        t.with_column("cost", ColumnData::Float(vec![Some(1.0), None, Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0)]))
            .unwrap();
        let split = SplitAssignment::new(vec![0, 1, 2, 3, 4, 5], vec![6, 7]);
        let roles = cont_cat_split(&t, 1, "cost");
        let result = TabularData::new(&t, &roles, "cost", &split, &PROCS);
        assert!(matches!(result, Err(TabError::SchemaError(_))));
    }

    #[test]
    fn test_split_outside_table_is_leakage() {
        let t = table();
        let split = SplitAssignment::new(vec![0, 1, 2, 3, 4, 5, 6], vec![7, 8]);
        let roles = cont_cat_split(&t, 1, "cost");
        let result = TabularData::new(&t, &roles, "cost", &split, &PROCS);
        assert!(matches!(result, Err(TabError::LeakageViolation(_))));
    }

    #[test]
    fn test_without_categorify_is_schema_error() {
        let t = table();
        let split = SplitAssignment::new(vec![0, 1, 2, 3, 4, 5], vec![6, 7]);
        let roles = cont_cat_split(&t, 1, "cost");
        let result = TabularData::new(&t, &roles, "cost", &split, &[ProcKind::FillMissing, ProcKind::Normalize]);
        assert!(matches!(result, Err(TabError::SchemaError(_))));
    }
}
