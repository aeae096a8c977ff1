//! tabeval - Model evaluation pipeline for tabular data
//!
//! A reusable train/test/cross-validation workflow for comparing predictive
//! models on small-to-medium tabular datasets:
//! - [`dataset`] - In-memory tabular structure and categorical encoding
//! - [`split`] - Holdout and (repeated) k-fold partitioning
//! - [`model`] - Model specs and fitting (linear, LASSO, logistic, random
//!   forest, null baseline)
//! - [`score`] - RMSE, R², MAE, accuracy, ROC-AUC
//! - [`resample`] - Bootstrap prediction and metric intervals
//! - [`compare`] - Ranked comparison tables with the null model as reference
//! - [`pipeline`] - End-to-end orchestration of the above
//!
//! Every randomized step takes an explicit seed and derives sub-seeds
//! deterministically, so identical inputs always produce identical output.
//! Dataset loading and result rendering are left to the caller; the pipeline
//! consumes an in-memory [`dataset::Dataset`] and returns an in-memory
//! [`compare::ComparisonTable`].

pub mod error;

pub mod compare;
pub mod dataset;
pub mod model;
pub mod pipeline;
pub mod resample;
pub mod score;
pub mod split;

pub use error::{EvalError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{EvalError, Result};

    // Data
    pub use crate::dataset::{Column, Dataset, OneHotEncoder};

    // Splitting
    pub use crate::split::{holdout_split, kfold_split, Fold};

    // Models
    pub use crate::model::{
        FittedModel, ForestConfig, ModelFamily, ModelSpec, TaskKind,
    };

    // Scoring
    pub use crate::score::{score, Metric, MetricKind};

    // Resampling
    pub use crate::resample::{bootstrap, ResampleRow, ResampleSummary};

    // Comparison
    pub use crate::compare::{compare, ComparisonEntry, ComparisonTable};

    // Pipeline
    pub use crate::pipeline::{
        evaluate_holdout, evaluate_in_sample, evaluate_kfold, EvalConfig,
    };
}
