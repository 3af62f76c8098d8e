//! End-to-end pipeline: load, combine, classify, split, preprocess, train,
//! predict and write the submission.

use crate::config::PipelineConfig;
use crate::data::{combine, read_csv, CombinedTable, Table};
use crate::error::{Result, TabError};
use crate::preprocessing::{cont_cat_split, ColumnRoles, RandomSplitter, SplitAssignment, TabularData};
use crate::submission::write_submission;
use crate::training::{EpochStats, LearnerConfig, Predictor, TabularLearner};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// The three input tables
#[derive(Debug, Clone)]
pub struct Inputs {
    pub train: Table,
    pub test: Table,
    pub sample_submission: Table,
}

/// Everything derived from the inputs before training
#[derive(Debug)]
pub struct PreparedData {
    pub combined: CombinedTable,
    /// Roles computed over the combined table
    pub roles: ColumnRoles,
    pub split: SplitAssignment,
    pub tabular: TabularData,
}

/// Summary of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub n_train: usize,
    pub n_test: usize,
    pub cat_names: Vec<String>,
    pub cont_names: Vec<String>,
    pub n_train_split: usize,
    pub n_valid_split: usize,
    pub history: Vec<EpochStats>,
    /// RMSE on the validation rows after the last epoch
    pub valid_rmse: Option<f64>,
    pub submission_path: PathBuf,
}

/// Pipeline driven by one [`PipelineConfig`]
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read train, test and sample submission from the data directory
    pub fn load_inputs(&self) -> Result<Inputs> {
        let train = read_csv(self.config.train_path())?;
        let test = read_csv(self.config.test_path())?;
        let sample_submission = read_csv(self.config.sample_submission_path())?;
        info!(
            train_rows = train.nrows(),
            test_rows = test.nrows(),
            sample_rows = sample_submission.nrows(),
            "Loaded inputs"
        );
        Ok(Inputs {
            train,
            test,
            sample_submission,
        })
    }

    fn splitter(&self) -> RandomSplitter {
        let splitter = RandomSplitter::new(self.config.valid_pct);
        match self.config.seed {
            Some(seed) => splitter.with_random_state(seed),
            None => splitter,
        }
    }

    /// Combine, classify, split and fit the procs
    pub fn prepare(&self, inputs: &Inputs) -> Result<PreparedData> {
        let target = self.config.target.as_str();
        if !inputs.train.has_column(target) {
            return Err(TabError::SchemaError(format!(
                "train table has no target column '{}'",
                target
            )));
        }

        let combined = combine(&inputs.train, &inputs.test, target)?;
        let roles = cont_cat_split(combined.table(), self.config.max_card, target);
        info!(cat_names = ?roles.cat_names, cont_names = ?roles.cont_names, "Classified columns");

        let split = self.splitter().split(combined.n_train())?;
        info!(train = split.train.len(), valid = split.valid.len(), "Split train rows");
        if split.valid.is_empty() {
            warn!("Validation set is empty; no metric will be reported");
        }

        let train_rows = combined.train()?;
        let tabular = TabularData::new(&train_rows, &roles, target, &split, &self.config.procs)?;

        Ok(PreparedData {
            combined,
            roles,
            split,
            tabular,
        })
    }

    fn learner_config(&self) -> LearnerConfig {
        LearnerConfig {
            layers: self.config.layers.clone(),
            learning_rate: self.config.learning_rate,
            seed: self.config.seed,
        }
    }

    /// Fit a learner on the prepared train rows
    pub fn train(&self, prepared: &PreparedData) -> Result<(TabularLearner, Vec<EpochStats>)> {
        let dls = prepared.tabular.dataloaders(self.config.batch_size, self.config.seed)?;
        let mut learner = TabularLearner::new(self.learner_config())?;
        let history = learner.fit(&dls, self.config.epochs)?;
        Ok((learner, history))
    }

    /// One prediction per test row, in test-row order
    pub fn predict(&self, learner: &impl Predictor, prepared: &PreparedData) -> Result<Array1<f64>> {
        let test_rows = prepared.combined.test()?;
        let dl = prepared.tabular.test_dl(&test_rows, self.config.batch_size)?;
        learner.predict(&dl)
    }

    /// Run every stage and write the submission
    pub fn run(&self) -> Result<PipelineReport> {
        let start = Instant::now();
        let inputs = self.load_inputs()?;
        let prepared = self.prepare(&inputs)?;
        let (learner, history) = self.train(&prepared)?;
        let preds = self.predict(&learner, &prepared)?;

        write_submission(&inputs.sample_submission, &preds, &self.config.target, &self.config.output)?;

        let valid_rmse = history.last().and_then(|s| s.rmse);
        info!(
            valid_rmse = ?valid_rmse,
            output = %self.config.output.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pipeline finished"
        );

        Ok(PipelineReport {
            n_train: prepared.combined.n_train(),
            n_test: prepared.combined.n_test(),
            cat_names: prepared.tabular.cat_names().to_vec(),
            cont_names: prepared.tabular.cont_names().to_vec(),
            n_train_split: prepared.split.train.len(),
            n_valid_split: prepared.split.valid.len(),
            history,
            valid_rmse,
            submission_path: self.config.output.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_inputs(dir: &Path) {
        fs::write(
            dir.join("train.csv"),
            "id,store,area,cost\n1,a,10.5,100\n2,b,,120\n3,a,12.0,90\n4,c,8.0,150\n5,b,9.5,110\n",
        )
        .unwrap();
        fs::write(dir.join("test.csv"), "id,store,area\n6,a,11.0\n7,d,\n").unwrap();
        fs::write(dir.join("sample_submission.csv"), "id,cost\n6,0\n7,0\n").unwrap();
    }

    fn config(dir: &Path) -> PipelineConfig {
        PipelineConfig::new()
            .with_data_dir(dir)
            .with_output(dir.join("submission.csv"))
            .with_layers(vec![8])
            .with_epochs(2)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Pipeline::new(PipelineConfig::new().with_valid_pct(1.5));
        assert!(matches!(result, Err(TabError::InvalidParameter { .. })));
    }

    #[test]
    fn test_prepare_roles_exclude_target() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let pipeline = Pipeline::new(config(dir.path())).unwrap();
        let inputs = pipeline.load_inputs().unwrap();
        let prepared = pipeline.prepare(&inputs).unwrap();

        assert_eq!(prepared.combined.len(), 7);
        assert_eq!(prepared.roles.cat_names, vec!["store".to_string()]);
        assert_eq!(prepared.roles.cont_names, vec!["id".to_string(), "area".to_string()]);
        assert_eq!(prepared.split.train.len() + prepared.split.valid.len(), 5);
        assert!(!prepared.roles.contains("cost"));
    }

    #[test]
    fn test_missing_target_in_train() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let pipeline = Pipeline::new(config(dir.path()).with_target("price")).unwrap();
        let inputs = pipeline.load_inputs().unwrap();
        assert!(matches!(pipeline.prepare(&inputs), Err(TabError::SchemaError(_))));
    }

    #[test]
    fn test_run_writes_submission() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let report = Pipeline::new(config(dir.path())).unwrap().run().unwrap();

        assert_eq!(report.n_train, 5);
        assert_eq!(report.n_test, 2);
        assert_eq!(report.n_valid_split, 1);
        assert_eq!(report.history.len(), 2);
        assert!(report.submission_path.exists());
    }
}
