//! Learner: model, optimizer and training loop

use super::{rmse, Adam, TabDataLoader, TabDataLoaders, TabularModel};
use crate::error::{Result, TabError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Anything that can be fitted on loaders and predict one value per row
pub trait Predictor {
    /// Train for `epochs` passes over `dls.train`
    fn fit(&mut self, dls: &TabDataLoaders, epochs: usize) -> Result<Vec<EpochStats>>;

    /// One prediction per row of `dl`, in loader order
    fn predict(&self, dl: &TabDataLoader) -> Result<Array1<f64>>;
}

/// Learner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerConfig {
    /// Hidden layer widths
    pub layers: Vec<usize>,
    pub learning_rate: f64,
    /// Seeds weight init and batch shuffling
    pub seed: Option<u64>,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            layers: vec![200, 100],
            learning_rate: 1e-3,
            seed: Some(42),
        }
    }
}

/// Losses and metric after one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub epoch: usize,
    /// Mean squared error over the epoch's training batches
    pub train_loss: f64,
    /// `None` when the validation set is empty
    pub valid_loss: Option<f64>,
    pub rmse: Option<f64>,
}

/// Embedding network trained with Adam on mean squared error
#[derive(Debug, Clone)]
pub struct TabularLearner {
    config: LearnerConfig,
    model: Option<TabularModel>,
    optimizer: Adam,
    history: Vec<EpochStats>,
}

impl TabularLearner {
    pub fn new(config: LearnerConfig) -> Result<Self> {
        if !(config.learning_rate > 0.0 && config.learning_rate.is_finite()) {
            return Err(TabError::invalid(
                "learning_rate",
                config.learning_rate,
                "must be positive and finite",
            ));
        }
        let optimizer = Adam::new(config.learning_rate);
        Ok(Self {
            config,
            model: None,
            optimizer,
            history: Vec::new(),
        })
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn model(&self) -> Option<&TabularModel> {
        self.model.as_ref()
    }

    pub fn history(&self) -> &[EpochStats] {
        &self.history
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    fn fitted_model(&self) -> Result<&TabularModel> {
        self.model.as_ref().ok_or(TabError::NotFitted)
    }

    /// Predictions for every row of `dl`, in order
    pub fn get_preds(&self, dl: &TabDataLoader) -> Result<Array1<f64>> {
        let model = self.fitted_model()?;
        let mut preds = Vec::with_capacity(dl.len());
        for batch in dl.batches(0) {
            preds.extend(model.predict(batch.cats(), batch.conts())?);
        }
        Ok(Array1::from(preds))
    }

    /// `(mse, rmse)` over a labelled loader
    pub fn validate(&self, dl: &TabDataLoader) -> Result<(f64, f64)> {
        let ys = dl
            .data()
            .ys()
            .ok_or_else(|| TabError::SchemaError("validation rows have no targets".to_string()))?;
        let preds = self.get_preds(dl)?;
        let rmse = rmse(ys, &preds)?;
        Ok((rmse * rmse, rmse))
    }

    fn build_model(&self, dls: &TabDataLoaders) -> Result<TabularModel> {
        let ys = dls
            .train
            .data()
            .ys()
            .ok_or_else(|| TabError::SchemaError("training rows have no targets".to_string()))?;
        let model = TabularModel::new(dls.cardinalities(), dls.n_cont(), &self.config.layers, self.config.seed)?;
        Ok(model.with_output_bias(ys.mean().unwrap_or(0.0)))
    }

    fn train_epoch(&mut self, dls: &TabDataLoaders, epoch: u64) -> Result<f64> {
        let model = self.model.as_mut().ok_or(TabError::NotFitted)?;
        let mut total = 0.0;
        for batch in dls.train.batches(epoch) {
            let ys = batch
                .ys()
                .ok_or_else(|| TabError::SchemaError("training rows have no targets".to_string()))?;
            let cache = model.forward(batch.cats(), batch.conts())?;
            let loss = (cache.output() - ys).mapv(|d| d * d).sum();
            if !loss.is_finite() {
                return Err(TabError::TrainingError(format!("loss diverged in epoch {}", epoch)));
            }
            total += loss;

            let grads = model.backward(&cache, batch.cats(), ys)?;
            model.step(&grads, &mut self.optimizer);
        }
        Ok(total / dls.train.len() as f64)
    }
}

impl Predictor for TabularLearner {
    fn fit(&mut self, dls: &TabDataLoaders, epochs: usize) -> Result<Vec<EpochStats>> {
        if dls.train.is_empty() {
            return Err(TabError::TrainingError("no training rows".to_string()));
        }
        if self.model.is_none() {
            let model = self.build_model(dls)?;
            info!(
                emb_sizes = ?model.emb_sizes(),
                n_inputs = model.n_inputs(),
                n_params = model.n_params(),
                "Built tabular model"
            );
            self.model = Some(model);
        }

        let start = Instant::now();
        let mut stats = Vec::with_capacity(epochs);
        for _ in 0..epochs {
            let epoch = self.history.len();
            let train_loss = self.train_epoch(dls, epoch as u64)?;
            let (valid_loss, rmse) = if dls.valid.is_empty() {
                (None, None)
            } else {
                let (loss, rmse) = self.validate(&dls.valid)?;
                (Some(loss), Some(rmse))
            };

            info!(epoch, train_loss, valid_loss = ?valid_loss, rmse = ?rmse, "Epoch complete");
            let epoch_stats = EpochStats {
                epoch,
                train_loss,
                valid_loss,
                rmse,
            };
            self.history.push(epoch_stats.clone());
            stats.push(epoch_stats);
        }
        debug!(epochs, elapsed_ms = start.elapsed().as_millis() as u64, "Training finished");
        Ok(stats)
    }

    fn predict(&self, dl: &TabDataLoader) -> Result<Array1<f64>> {
        self.get_preds(dl)
    }
}
