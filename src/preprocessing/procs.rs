//! Proc trait and the built-in proc kinds

use super::{Categorify, ColumnRoles, FillMissing, Normalize};
use crate::data::Table;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A column transform fitted on training rows and applied to any rows.
///
/// `setup` only ever sees the training subset (already encoded by the procs
/// before it in the chain). `encode` must not change the fitted state.
pub trait TabularProc: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Fit state on the training subset. May register new categorical
    /// columns in `roles`.
    fn setup(&mut self, train: &Table, roles: &mut ColumnRoles) -> Result<()>;

    /// Apply the fitted state
    fn encode(&self, table: &Table) -> Result<Table>;

    /// Fitted state as JSON, for inspection and comparison
    fn state(&self) -> Result<serde_json::Value>;

    /// `(column, number of codes)` for every categorical column this proc
    /// encodes, code 0 included
    fn cardinalities(&self) -> Vec<(String, usize)> {
        Vec::new()
    }
}

/// Built-in procs, in the order they are listed in the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcKind {
    /// Map category values to integer codes
    Categorify,
    /// Fill missing continuous values with the train median
    FillMissing,
    /// Standardise continuous columns with train mean and std
    Normalize,
}

impl ProcKind {
    /// Create an unfitted proc
    pub fn build(self) -> Box<dyn TabularProc> {
        match self {
            ProcKind::Categorify => Box::new(Categorify::new()),
            ProcKind::FillMissing => Box::new(FillMissing::new()),
            ProcKind::Normalize => Box::new(Normalize::new()),
        }
    }
}
