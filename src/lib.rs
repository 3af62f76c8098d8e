//! tabcost - Tabular cost regression pipeline
//!
//! Reads a train / test / sample-submission triple, fits a categorical
//! embedding network on the training rows and writes predicted costs into
//! the submission template.
//!
//! # Modules
//!
//! - [`data`] - Typed tables, CSV I/O and train/test combination
//! - [`preprocessing`] - Column roles, splitting and fitted procs
//! - [`training`] - Data loaders, model, optimizer and learner
//! - [`submission`] - Writing predictions into the template
//! - [`pipeline`] - All stages driven from one [`PipelineConfig`]
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Pipeline stages
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod submission;
pub mod pipeline;

// Services
pub mod cli;

pub use config::PipelineConfig;
pub use error::{Result, TabError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, TabError};

    // Configuration
    pub use crate::config::PipelineConfig;

    // Data
    pub use crate::data::{combine, read_csv, write_csv, ColumnData, ColumnKind, CombinedTable, Table};

    // Preprocessing
    pub use crate::preprocessing::{
        cont_cat_split, ColumnRoles, ProcKind, ProcessedSplit, RandomSplitter, SplitAssignment, TabularData,
    };

    // Training
    pub use crate::training::{EpochStats, LearnerConfig, Predictor, TabDataLoader, TabDataLoaders, TabularLearner};

    // Submission and pipeline
    pub use crate::pipeline::{Pipeline, PipelineReport};
    pub use crate::submission::{fill_submission, write_submission};
}
