//! Standardisation of continuous columns

use super::{ColumnRoles, TabularProc};
use crate::data::{ColumnData, Table};
use crate::error::{Result, TabError};
use serde::{Deserialize, Serialize};

/// Added to every std so constant columns do not divide by zero
const STD_EPS: f64 = 1e-7;

/// Mean and population standard deviation of one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: f64,
    pub std: f64,
}

impl ColumnStats {
    /// Stats over the present values; an empty column gets mean 0, std 1
    fn from_values(values: &[Option<f64>]) -> Self {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return Self { mean: 0.0, std: 1.0 };
        }
        let n = present.len() as f64;
        let mean = present.iter().sum::<f64>() / n;
        let var = present.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self { mean, std: var.sqrt() }
    }

    fn scale(&self, x: f64) -> f64 {
        (x - self.mean) / (self.std + STD_EPS)
    }
}

/// Standardises continuous columns: `(x - mean) / (std + 1e-7)` with the
/// mean and population std of the training rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Normalize {
    stats: Vec<(String, ColumnStats)>,
    is_fitted: bool,
}

impl Normalize {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self, column: &str) -> Option<ColumnStats> {
        self.stats.iter().find(|(n, _)| n == column).map(|(_, s)| *s)
    }
}

impl TabularProc for Normalize {
    fn name(&self) -> &'static str {
        "Normalize"
    }

    fn setup(&mut self, train: &Table, roles: &mut ColumnRoles) -> Result<()> {
        self.stats = roles
            .cont_names
            .iter()
            .map(|name| Ok((name.clone(), ColumnStats::from_values(&train.numeric(name)?))))
            .collect::<Result<Vec<_>>>()?;
        self.is_fitted = true;
        Ok(())
    }

    fn encode(&self, table: &Table) -> Result<Table> {
        if !self.is_fitted {
            return Err(TabError::NotFitted);
        }
        let mut result = table.clone();
        for (name, stats) in &self.stats {
            let scaled = table
                .numeric(name)?
                .into_iter()
                .map(|v| v.map(|x| stats.scale(x)))
                .collect();
            result.with_column(name.clone(), ColumnData::Float(scaled))?;
        }
        Ok(result)
    }

    fn state(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train() -> Table {
        Table::new(vec![(
            "area".to_string(),
            ColumnData::Float(vec![Some(2.0), Some(4.0), Some(4.0), Some(4.0), Some(5.0), Some(5.0), Some(7.0), Some(9.0)]),
        )])
        .unwrap()
    }

    fn roles() -> ColumnRoles {
        ColumnRoles::new(vec![], vec!["area".into()])
    }

    #[test]
    fn test_population_std() {
        let mut proc = Normalize::new();
        proc.setup(&train(), &mut roles()).unwrap();
        let stats = proc.stats("area").unwrap();
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_encode_standardises() {
        let mut proc = Normalize::new();
        proc.setup(&train(), &mut roles()).unwrap();
        let encoded = proc.encode(&train()).unwrap();
        let values: Vec<f64> = encoded.floats("area").unwrap().iter().flatten().copied().collect();

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert!(mean.abs() < 1e-9);
        assert!((values[0] + 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_constant_column_stays_finite() {
        let table = Table::new(vec![("c".to_string(), ColumnData::Int(vec![Some(3), Some(3)]))]).unwrap();
        let mut proc = Normalize::new();
        proc.setup(&table, &mut ColumnRoles::new(vec![], vec!["c".into()])).unwrap();
        let encoded = proc.encode(&table).unwrap();
        assert_eq!(encoded.floats("c").unwrap(), &[Some(0.0), Some(0.0)]);
    }
}
