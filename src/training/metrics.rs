//! Regression metrics

use crate::error::{Result, TabError};
use ndarray::Array1;

/// Mean squared error
pub fn mse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(TabError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: y_pred.len().to_string(),
        });
    }
    if y_true.is_empty() {
        return Err(TabError::invalid("y_true", 0, "cannot score an empty set"));
    }
    let sum: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    Ok(sum / y_true.len() as f64)
}

/// Root mean squared error
pub fn rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    Ok(mse(y_true, y_pred)?.sqrt())
}
