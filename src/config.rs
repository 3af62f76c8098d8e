//! Pipeline configuration

use crate::error::{Result, TabError};
use crate::preprocessing::ProcKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration threaded through every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the competition files
    pub data_dir: PathBuf,

    pub train_file: String,
    pub test_file: String,
    pub sample_submission_file: String,

    /// Where the submission is written
    pub output: PathBuf,

    /// Dependent variable
    pub target: String,

    /// Integer columns with more distinct values than this are continuous
    pub max_card: usize,

    /// Fraction of train rows held out for validation
    pub valid_pct: f64,

    /// Random seed for the split, weight init and batch shuffling
    pub seed: Option<u64>,

    /// Ordered preprocessing chain
    pub procs: Vec<ProcKind>,

    pub batch_size: usize,

    /// Hidden layer sizes
    pub layers: Vec<usize>,

    pub epochs: usize,

    pub learning_rate: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            train_file: "train.csv".to_string(),
            test_file: "test.csv".to_string(),
            sample_submission_file: "sample_submission.csv".to_string(),
            output: PathBuf::from("submission.csv"),
            target: "cost".to_string(),
            max_card: 1,
            valid_pct: 0.2,
            seed: Some(42),
            procs: vec![ProcKind::Categorify, ProcKind::FillMissing, ProcKind::Normalize],
            batch_size: 1024,
            layers: vec![200, 100],
            epochs: 5,
            learning_rate: 1e-3,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; missing keys take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| TabError::file(path, e))?;
        serde_json::from_str(&json)
            .map_err(|e| TabError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Save the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_max_card(mut self, max_card: usize) -> Self {
        self.max_card = max_card;
        self
    }

    pub fn with_valid_pct(mut self, valid_pct: f64) -> Self {
        self.valid_pct = valid_pct;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_procs(mut self, procs: Vec<ProcKind>) -> Self {
        self.procs = procs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_layers(mut self, layers: Vec<usize>) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn train_path(&self) -> PathBuf {
        self.data_dir.join(&self.train_file)
    }

    pub fn test_path(&self) -> PathBuf {
        self.data_dir.join(&self.test_file)
    }

    pub fn sample_submission_path(&self) -> PathBuf {
        self.data_dir.join(&self.sample_submission_file)
    }

    /// Check parameter ranges before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(TabError::invalid("target", "\"\"", "target column name must not be empty"));
        }
        if !(0.0..1.0).contains(&self.valid_pct) {
            return Err(TabError::invalid("valid_pct", self.valid_pct, "must be in [0, 1)"));
        }
        if self.batch_size == 0 {
            return Err(TabError::invalid("batch_size", 0, "must be positive"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(TabError::invalid("learning_rate", self.learning_rate, "must be a positive number"));
        }
        if self.layers.contains(&0) {
            return Err(TabError::invalid("layers", format!("{:?}", self.layers), "layer sizes must be positive"));
        }
        Ok(())
    }
}
