//! Model training module
//!
//! Provides the regression learner used by the pipeline:
//! - Batched data loaders over processed splits
//! - An embedding + dense ReLU network ([`TabularModel`])
//! - Adam optimisation
//! - RMSE / MSE metrics

mod dataloader;
mod learner;
mod metrics;
mod model;
mod optim;

pub use dataloader::{TabDataLoader, TabDataLoaders};
pub use learner::{EpochStats, LearnerConfig, Predictor, TabularLearner};
pub use metrics::{mse, rmse};
pub use model::{emb_sz_rule, TabularModel};
pub use optim::Adam;
