//! Integration test: Full pipeline (load → combine → preprocess → train → submission)

use std::fs;
use std::path::Path;
use tabcost::prelude::*;

const TRAIN: &str = "\
id,store,area,rooms,cost
1,north,120.5,3,210.0
2,south,80.0,2,150.5
3,north,,4,260.0
4,east,95.0,2,170.0
5,south,110.0,3,205.5
6,east,70.5,1,120.0
7,north,130.0,4,275.0
8,south,,3,190.0
9,east,100.0,2,180.5
";

const TEST: &str = "\
id,store,area,rooms
10,north,125.0,3
11,west,,2
12,south,90.0,2
";

const SAMPLE: &str = "\
id,cost
10,0
11,0
12,0
";

fn write_competition(dir: &Path) {
    fs::write(dir.join("train.csv"), TRAIN).unwrap();
    fs::write(dir.join("test.csv"), TEST).unwrap();
    fs::write(dir.join("sample_submission.csv"), SAMPLE).unwrap();
}

fn config(dir: &Path) -> PipelineConfig {
    PipelineConfig::new()
        .with_data_dir(dir)
        .with_output(dir.join("submission.csv"))
        .with_seed(Some(42))
        .with_layers(vec![16, 8])
        .with_epochs(3)
}

#[test]
fn test_end_to_end_small_competition() {
    let dir = tempfile::tempdir().unwrap();
    write_competition(dir.path());
    let pipeline = Pipeline::new(config(dir.path())).unwrap();

    let inputs = pipeline.load_inputs().unwrap();
    let prepared = pipeline.prepare(&inputs).unwrap();
    assert_eq!(prepared.combined.len(), 12);
    assert_eq!(prepared.combined.train_idxs(), 0..9);
    assert_eq!(prepared.combined.test_idxs(), 9..12);
    assert_eq!(prepared.split.train.len(), 7);
    assert_eq!(prepared.split.valid.len(), 2);
    assert!(!prepared.roles.contains("cost"));

    let report = pipeline.run().unwrap();
    assert_eq!(report.n_train, 9);
    assert_eq!(report.n_test, 3);
    assert_eq!(report.n_train_split, 7);
    assert_eq!(report.n_valid_split, 2);
    assert_eq!(report.history.len(), 3);
    assert!(report.valid_rmse.is_some());

    let submission = read_csv(dir.path().join("submission.csv")).unwrap();
    assert_eq!(submission.column_names(), &["id".to_string(), "cost".to_string()]);
    assert_eq!(submission.ints("id").unwrap(), &[Some(10), Some(11), Some(12)]);
    let costs = submission.floats("cost").unwrap();
    assert_eq!(costs.len(), 3);
    assert!(costs.iter().all(|c| c.map_or(false, f64::is_finite)));
}

#[test]
fn test_column_roles_for_competition() {
    let dir = tempfile::tempdir().unwrap();
    write_competition(dir.path());
    let pipeline = Pipeline::new(config(dir.path())).unwrap();
    let prepared = pipeline.prepare(&pipeline.load_inputs().unwrap()).unwrap();

    assert_eq!(prepared.roles.cat_names, vec!["store".to_string()]);
    assert_eq!(
        prepared.roles.cont_names,
        vec!["id".to_string(), "area".to_string(), "rooms".to_string()]
    );

    // a higher max_card turns the low-cardinality int column categorical
    let pipeline = Pipeline::new(config(dir.path()).with_max_card(10)).unwrap();
    let prepared = pipeline.prepare(&pipeline.load_inputs().unwrap()).unwrap();
    assert!(prepared.roles.cat_names.contains(&"rooms".to_string()));
}

#[test]
fn test_runs_are_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    write_competition(dir.path());
    let pipeline = Pipeline::new(config(dir.path())).unwrap();

    let first = pipeline.run().unwrap();
    let first_csv = fs::read_to_string(dir.path().join("submission.csv")).unwrap();
    let second = pipeline.run().unwrap();
    let second_csv = fs::read_to_string(dir.path().join("submission.csv")).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_csv, second_csv);
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    write_competition(dir.path());
    fs::remove_file(dir.path().join("test.csv")).unwrap();

    let result = Pipeline::new(config(dir.path())).unwrap().run();
    assert!(matches!(result, Err(TabError::FileError { .. })));
    assert!(!dir.path().join("submission.csv").exists());
}

#[test]
fn test_schema_mismatch_leaves_no_submission() {
    let dir = tempfile::tempdir().unwrap();
    write_competition(dir.path());
    fs::write(dir.path().join("test.csv"), "id,store,garden\n10,north,1\n").unwrap();

    let result = Pipeline::new(config(dir.path())).unwrap().run();
    assert!(matches!(result, Err(TabError::SchemaError(_))));
    assert!(!dir.path().join("submission.csv").exists());
}

#[test]
fn test_sample_submission_length_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    write_competition(dir.path());
    fs::write(dir.path().join("sample_submission.csv"), "id,cost\n10,0\n11,0\n").unwrap();

    let result = Pipeline::new(config(dir.path())).unwrap().run();
    assert!(matches!(result, Err(TabError::SchemaError(_))));
    assert!(!dir.path().join("submission.csv").exists());
}
