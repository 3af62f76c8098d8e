//! Categorical / continuous column classification

use super::ColumnRoles;
use crate::data::{ColumnKind, Table};
use tracing::debug;

/// Split the columns of `table` into continuous and categorical roles.
///
/// Float columns are continuous, integer columns are continuous when they
/// hold a missing value or more than `max_card` distinct values, and
/// everything else is categorical. `dep_var` is skipped.
///
/// Run this once on the combined train + test table so both sides share
/// the same roles.
pub fn cont_cat_split(table: &Table, max_card: usize, dep_var: &str) -> ColumnRoles {
    let mut roles = ColumnRoles::default();

    for (name, column) in table.iter() {
        if name == dep_var {
            continue;
        }
        let continuous = match column.kind() {
            ColumnKind::Float => true,
            ColumnKind::Int => column.null_count() > 0 || column.n_unique() > max_card,
            ColumnKind::Str => false,
        };
        if continuous {
            roles.cont_names.push(name.to_string());
        } else {
            roles.cat_names.push(name.to_string());
        }
    }

    debug!(
        max_card,
        categorical = ?roles.cat_names,
        continuous = ?roles.cont_names,
        "Classified columns"
    );
    roles
}
