//! Integration test: Preprocessing fitted on training rows only

use tabcost::prelude::*;

fn train_table() -> Table {
    Table::new(vec![
        ("id".to_string(), ColumnData::Int((1..=10).map(Some).collect())),
        (
            "store".to_string(),
            ColumnData::Str(
                ["a", "b", "a", "c", "b", "a", "c", "b", "a", "c"]
                    .iter()
                    .map(|s| Some(s.to_string()))
                    .collect(),
            ),
        ),
        (
            "area".to_string(),
            ColumnData::Float(vec![
                Some(50.0), Some(60.0), None, Some(80.0), Some(90.0),
                Some(100.0), Some(55.0), None, Some(75.0), Some(85.0),
            ]),
        ),
        (
            "cost".to_string(),
            ColumnData::Float((1..=10).map(|i| Some(i as f64 * 10.0)).collect()),
        ),
    ])
    .unwrap()
}

fn test_table(area: f64, store: &str) -> Table {
    Table::new(vec![
        ("id".to_string(), ColumnData::Int(vec![Some(11), Some(12)])),
        ("store".to_string(), ColumnData::Str(vec![Some(store.to_string()), Some("a".to_string())])),
        ("area".to_string(), ColumnData::Float(vec![Some(area), None])),
    ])
    .unwrap()
}

const PROCS: [ProcKind; 3] = [ProcKind::Categorify, ProcKind::FillMissing, ProcKind::Normalize];

fn fit_with(test: &Table, split: SplitAssignment) -> (CombinedTable, SplitAssignment, TabularData) {
    let combined = combine(&train_table(), test, "cost").unwrap();
    let roles = cont_cat_split(combined.table(), 1, "cost");
    let data = TabularData::new(&combined.train().unwrap(), &roles, "cost", &split, &PROCS).unwrap();
    (combined, split, data)
}

fn fit(test: &Table, seed: u64) -> (CombinedTable, SplitAssignment, TabularData) {
    let split = RandomSplitter::new(0.2).with_random_state(seed).split(10).unwrap();
    fit_with(test, split)
}

#[test]
fn test_fitted_state_ignores_test_rows() {
    let (_, _, base) = fit(&test_table(80.0, "a"), 3);
    let (_, _, other) = fit(&test_table(1e9, "never-seen"), 3);

    assert_eq!(base.fitted_state().unwrap(), other.fitted_state().unwrap());
    assert_eq!(base.train(), other.train());
    assert_eq!(base.valid(), other.valid());
}

#[test]
fn test_split_and_matrices_are_idempotent() {
    let test = test_table(70.0, "b");
    let (_, split_a, a) = fit(&test, 11);
    let (_, split_b, b) = fit(&test, 11);

    assert_eq!(split_a, split_b);
    assert_eq!(a.train(), b.train());
    assert_eq!(a.valid(), b.valid());
}

#[test]
fn test_split_covers_train_rows_only() {
    let (combined, split, _) = fit(&test_table(70.0, "b"), 5);
    assert_eq!(split.train.len(), 8);
    assert_eq!(split.valid.len(), 2);

    let mut all: Vec<usize> = split.train.iter().chain(&split.valid).copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..combined.n_train()).collect::<Vec<_>>());
}

#[test]
fn test_different_seeds_give_different_splits() {
    let test = test_table(70.0, "b");
    let splits: Vec<SplitAssignment> = (0..5).map(|seed| fit(&test, seed).1).collect();
    assert!(splits.windows(2).any(|w| w[0] != w[1]));
}

#[test]
fn test_test_rows_use_train_vocabulary() {
    let split = SplitAssignment::new((0..8).collect(), vec![8, 9]);
    let (combined, _, data) = fit_with(&test_table(70.0, "zzz"), split);
    let processed = data.process(&combined.test().unwrap()).unwrap();

    assert_eq!(processed.len(), 2);
    assert!(processed.ys().is_none());
    // unseen store
    assert_eq!(processed.cats()[[0, 0]], 0);
    let area_na = data.cat_names().iter().position(|n| n == "area_na").unwrap();
    assert_eq!(processed.cats()[[1, area_na]], 2);
}
