//! Category-to-code encoding

use super::{ColumnRoles, TabularProc};
use crate::data::{ColumnData, Table};
use crate::error::{Result, TabError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder category at code 0, used for missing and unseen values
pub const NA_CATEGORY: &str = "#na#";

/// Ordered vocabulary of one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMap {
    items: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl CategoryMap {
    /// Vocabulary `["#na#", values...]`
    pub fn new(values: Vec<String>) -> Self {
        let mut items = Vec::with_capacity(values.len() + 1);
        items.push(NA_CATEGORY.to_string());
        items.extend(values.into_iter().filter(|v| v != NA_CATEGORY));
        let index = items.iter().enumerate().map(|(i, v)| (v.clone(), i)).collect();
        Self { items, index }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Code of `value`; missing and unknown values map to 0
    pub fn code(&self, value: Option<&str>) -> usize {
        value
            .and_then(|v| match self.index.get(v) {
                Some(&i) => Some(i),
                // index is skipped by serde; fall back to a scan after deserialize
                None if self.index.is_empty() => self.items.iter().position(|x| x == v),
                None => None,
            })
            .unwrap_or(0)
    }
}

/// Replaces every categorical column by integer codes into a vocabulary
/// built from the training rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Categorify {
    classes: Vec<(String, CategoryMap)>,
    is_fitted: bool,
}

impl Categorify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classes(&self, column: &str) -> Option<&CategoryMap> {
        self.classes.iter().find(|(n, _)| n == column).map(|(_, m)| m)
    }

    fn encode_column(map: &CategoryMap, column: &ColumnData) -> ColumnData {
        let codes = (0..column.len())
            .map(|row| Some(map.code(column.key(row).as_deref()) as i64))
            .collect();
        ColumnData::Int(codes)
    }
}

impl TabularProc for Categorify {
    fn name(&self) -> &'static str {
        "Categorify"
    }

    fn setup(&mut self, train: &Table, roles: &mut ColumnRoles) -> Result<()> {
        self.classes = roles
            .cat_names
            .iter()
            .map(|name| {
                let column = train.column(name)?;
                Ok((name.clone(), CategoryMap::new(column.distinct_sorted())))
            })
            .collect::<Result<Vec<_>>>()?;
        self.is_fitted = true;
        Ok(())
    }

    fn encode(&self, table: &Table) -> Result<Table> {
        if !self.is_fitted {
            return Err(TabError::NotFitted);
        }
        let mut result = table.clone();
        for (name, map) in &self.classes {
            result.map_column(name, |column| Ok(Self::encode_column(map, column)))?;
        }
        Ok(result)
    }

    fn state(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn cardinalities(&self) -> Vec<(String, usize)> {
        self.classes
            .iter()
            .map(|(name, map)| (name.clone(), map.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train() -> Table {
        Table::new(vec![
            ("store".to_string(), ColumnData::Str(vec![Some("b".into()), Some("a".into()), None, Some("b".into())])),
            ("kids".to_string(), ColumnData::Int(vec![Some(10), Some(2), Some(2), Some(0)])),
        ])
        .unwrap()
    }

    fn roles() -> ColumnRoles {
        ColumnRoles::new(vec!["store".into(), "kids".into()], vec![])
    }

    #[test]
    fn test_vocab_sorted_with_na_first() {
        let mut proc = Categorify::new();
        proc.setup(&train(), &mut roles()).unwrap();

        assert_eq!(proc.classes("store").unwrap().items(), &["#na#", "a", "b"]);
        assert_eq!(proc.classes("kids").unwrap().items(), &["#na#", "0", "2", "10"]);
        assert_eq!(
            proc.cardinalities(),
            vec![("store".to_string(), 3), ("kids".to_string(), 4)]
        );
    }

    #[test]
    fn test_encode_codes() {
        let mut proc = Categorify::new();
        proc.setup(&train(), &mut roles()).unwrap();
        let encoded = proc.encode(&train()).unwrap();

        assert_eq!(encoded.ints("store").unwrap(), &[Some(2), Some(1), Some(0), Some(2)]);
        assert_eq!(encoded.ints("kids").unwrap(), &[Some(3), Some(2), Some(2), Some(1)]);
    }

    #[test]
    fn test_unseen_values_map_to_zero() {
        let mut proc = Categorify::new();
        proc.setup(&train(), &mut roles()).unwrap();

        let other = Table::new(vec![
            ("store".to_string(), ColumnData::Str(vec![Some("z".into()), Some("a".into())])),
            ("kids".to_string(), ColumnData::Int(vec![Some(99), None])),
        ])
        .unwrap();
        let encoded = proc.encode(&other).unwrap();
        assert_eq!(encoded.ints("store").unwrap(), &[Some(0), Some(1)]);
        assert_eq!(encoded.ints("kids").unwrap(), &[Some(0), Some(0)]);
    }

    #[test]
    fn test_encode_before_setup_fails() {
        assert!(matches!(Categorify::new().encode(&train()), Err(TabError::NotFitted)));
    }

    #[test]
    fn test_code_after_deserialize() {
        let map = CategoryMap::new(vec!["a".into(), "b".into()]);
        let json = serde_json::to_string(&map).unwrap();
        let restored: CategoryMap = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.code(Some("b")), 2);
        assert_eq!(restored.code(None), 0);
    }
}
