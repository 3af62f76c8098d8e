//! Data preprocessing module
//!
//! Everything between the combined table and the model inputs:
//! - Column classification into categorical / continuous roles
//! - Seeded train/validation splitting
//! - Procs fitted on the train subset (Categorify, FillMissing, Normalize)
//! - [`TabularData`], which owns the fitted procs and the processed splits

mod classify;
mod split;
mod procs;
mod categorify;
mod fill_missing;
mod normalize;
mod tabular;

pub use classify::cont_cat_split;
pub use split::{RandomSplitter, SplitAssignment};
pub use procs::{ProcKind, TabularProc};
pub use categorify::{Categorify, CategoryMap, NA_CATEGORY};
pub use fill_missing::FillMissing;
pub use normalize::{ColumnStats, Normalize};
pub use tabular::{ProcessedSplit, TabularData};

use serde::{Deserialize, Serialize};

/// Role a feature column plays in the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Categorical,
    Continuous,
}

/// Disjoint categorical and continuous column names, in table order.
///
/// The dependent variable never appears in either list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub cat_names: Vec<String>,
    pub cont_names: Vec<String>,
}

impl ColumnRoles {
    pub fn new(cat_names: Vec<String>, cont_names: Vec<String>) -> Self {
        Self { cat_names, cont_names }
    }

    pub fn role(&self, name: &str) -> Option<ColumnRole> {
        if self.cat_names.iter().any(|n| n == name) {
            Some(ColumnRole::Categorical)
        } else if self.cont_names.iter().any(|n| n == name) {
            Some(ColumnRole::Continuous)
        } else {
            None
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.role(name).is_some()
    }

    /// Register an extra categorical column (e.g. a missing-value flag)
    pub fn push_cat(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.cat_names.push(name);
        }
    }

    pub fn len(&self) -> usize {
        self.cat_names.len() + self.cont_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
