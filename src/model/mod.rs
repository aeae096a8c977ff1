//! Model specification and fitting
//!
//! A [`ModelSpec`] is an immutable description of one candidate model: which
//! column it predicts, from which predictors, and with which family and
//! hyperparameters. Families are a closed set of tagged variants, each
//! handled by a dedicated fit/predict implementation. Fitting produces an
//! opaque [`FittedModel`] that owns the categorical encoding learned on its
//! training subset.

pub mod baseline;
pub mod forest;
pub mod linear;
pub mod logistic;

pub use baseline::NullModel;
pub use forest::{Forest, ForestConfig};
pub use linear::LinearModel;
pub use logistic::LogisticModel;

use crate::dataset::{Dataset, OneHotEncoder};
use crate::error::{EvalError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Prediction task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    Regression,
    Classification,
}

/// Model family and its hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelFamily {
    /// Constant mean/mode predictor, the comparison floor
    Null,
    /// Ordinary least squares
    Linear,
    /// L1-regularized least squares
    Lasso { alpha: f64 },
    /// Binary logistic regression with L2 penalty
    Logistic {
        alpha: f64,
        max_iter: usize,
        learning_rate: f64,
    },
    /// Bagged randomized trees
    Forest(ForestConfig),
}

/// Immutable description of one candidate model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub label: String,
    pub outcome: String,
    pub predictors: Vec<String>,
    pub task: TaskKind,
    pub family: ModelFamily,
}

impl ModelSpec {
    pub fn new(
        label: impl Into<String>,
        outcome: impl Into<String>,
        predictors: Vec<String>,
        task: TaskKind,
        family: ModelFamily,
    ) -> Self {
        Self {
            label: label.into(),
            outcome: outcome.into(),
            predictors,
            task,
            family,
        }
    }

    /// Null baseline for the given outcome
    pub fn null(label: impl Into<String>, outcome: impl Into<String>, task: TaskKind) -> Self {
        Self::new(label, outcome, Vec::new(), task, ModelFamily::Null)
    }

    /// Linear regression on the given predictors
    pub fn linear(
        label: impl Into<String>,
        outcome: impl Into<String>,
        predictors: Vec<String>,
    ) -> Self {
        Self::new(label, outcome, predictors, TaskKind::Regression, ModelFamily::Linear)
    }

    /// LASSO regression with the given penalty
    pub fn lasso(
        label: impl Into<String>,
        outcome: impl Into<String>,
        predictors: Vec<String>,
        alpha: f64,
    ) -> Self {
        Self::new(
            label,
            outcome,
            predictors,
            TaskKind::Regression,
            ModelFamily::Lasso { alpha },
        )
    }

    /// Logistic regression with default optimizer settings
    pub fn logistic(
        label: impl Into<String>,
        outcome: impl Into<String>,
        predictors: Vec<String>,
    ) -> Self {
        Self::new(
            label,
            outcome,
            predictors,
            TaskKind::Classification,
            ModelFamily::Logistic {
                alpha: 0.01,
                max_iter: 1000,
                learning_rate: 0.1,
            },
        )
    }

    /// Random forest for the given task
    pub fn forest(
        label: impl Into<String>,
        outcome: impl Into<String>,
        predictors: Vec<String>,
        task: TaskKind,
        config: ForestConfig,
    ) -> Self {
        Self::new(label, outcome, predictors, task, ModelFamily::Forest(config))
    }

    fn validate(&self) -> Result<()> {
        match &self.family {
            ModelFamily::Null | ModelFamily::Linear => Ok(()),
            ModelFamily::Lasso { alpha } => {
                if *alpha < 0.0 {
                    return Err(EvalError::invalid_parameter(
                        "alpha",
                        alpha,
                        "regularization penalty must be non-negative",
                    ));
                }
                Ok(())
            }
            ModelFamily::Logistic {
                alpha,
                max_iter,
                learning_rate,
            } => {
                if *alpha < 0.0 {
                    return Err(EvalError::invalid_parameter(
                        "alpha",
                        alpha,
                        "regularization penalty must be non-negative",
                    ));
                }
                if *max_iter == 0 {
                    return Err(EvalError::invalid_parameter(
                        "max_iter",
                        max_iter,
                        "must be at least 1",
                    ));
                }
                if *learning_rate <= 0.0 {
                    return Err(EvalError::invalid_parameter(
                        "learning_rate",
                        learning_rate,
                        "must be positive",
                    ));
                }
                Ok(())
            }
            ModelFamily::Forest(config) => {
                if config.n_trees == 0 {
                    return Err(EvalError::invalid_parameter(
                        "n_trees",
                        config.n_trees,
                        "must be at least 1",
                    ));
                }
                if config.min_samples_leaf == 0 {
                    return Err(EvalError::invalid_parameter(
                        "min_samples_leaf",
                        config.min_samples_leaf,
                        "must be at least 1",
                    ));
                }
                if let Some(mtry) = config.mtry {
                    if mtry == 0 || mtry > self.predictors.len() {
                        return Err(EvalError::invalid_parameter(
                            "mtry",
                            mtry,
                            "must be between 1 and the number of predictors",
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    /// Fit this spec to a training subset
    ///
    /// Learns the categorical encoding on `train` and never mutates it.
    pub fn fit(&self, train: &Dataset) -> Result<FittedModel> {
        self.validate()?;

        let encoder = OneHotEncoder::fit(train, &self.predictors)?;
        let x = encoder.transform(train)?;
        let y = train.outcome(&self.outcome)?;

        let n = train.n_rows();
        let inner = match &self.family {
            ModelFamily::Null => FittedInner::Null(NullModel::fit(&y, self.task)?),
            ModelFamily::Linear => {
                require_records(n, encoder.n_features() + 1)?;
                FittedInner::Linear(linear::fit_ols(&x, &y)?)
            }
            ModelFamily::Lasso { alpha } => {
                require_records(n, encoder.n_features() + 1)?;
                FittedInner::Lasso(linear::fit_lasso(&x, &y, *alpha)?)
            }
            ModelFamily::Logistic {
                alpha,
                max_iter,
                learning_rate,
            } => {
                require_records(n, encoder.n_features() + 1)?;
                FittedInner::Logistic(logistic::fit_logistic(
                    &x,
                    &y,
                    *alpha,
                    *max_iter,
                    *learning_rate,
                )?)
            }
            ModelFamily::Forest(config) => {
                FittedInner::Forest(forest::fit_forest(&x, &y, config, self.task)?)
            }
        };

        Ok(FittedModel {
            spec: self.clone(),
            encoder,
            inner,
        })
    }
}

fn require_records(available: usize, needed: usize) -> Result<()> {
    if available < needed {
        return Err(EvalError::InsufficientData { needed, available });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum FittedInner {
    Null(NullModel),
    Linear(LinearModel),
    Lasso(LinearModel),
    Logistic(LogisticModel),
    Forest(Forest),
}

/// Immutable artifact produced by [`ModelSpec::fit`]
///
/// Owns the encoder learned on its training subset, so prediction on any
/// other subset reapplies the exact same encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    spec: ModelSpec,
    encoder: OneHotEncoder,
    inner: FittedInner,
}

impl FittedModel {
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn design_matrix(&self, subset: &Dataset) -> Result<Array2<f64>> {
        self.encoder.transform(subset)
    }

    /// One prediction per record, in input order
    ///
    /// Regression models return fitted values; classification models return
    /// hard labels.
    pub fn predict(&self, subset: &Dataset) -> Result<Array1<f64>> {
        let x = self.design_matrix(subset)?;
        Ok(match &self.inner {
            FittedInner::Null(m) => m.predict(subset.n_rows()),
            FittedInner::Linear(m) | FittedInner::Lasso(m) => m.predict(&x),
            FittedInner::Logistic(m) => m.predict(&x),
            FittedInner::Forest(m) => m.predict(&x),
        })
    }

    /// Continuous score per record, used for rank-based metrics
    ///
    /// Identical to [`FittedModel::predict`] for regression; for
    /// classification this is the class-1 probability.
    pub fn predict_score(&self, subset: &Dataset) -> Result<Array1<f64>> {
        let x = self.design_matrix(subset)?;
        Ok(match &self.inner {
            FittedInner::Null(m) => m.predict(subset.n_rows()),
            FittedInner::Linear(m) | FittedInner::Lasso(m) => m.predict(&x),
            FittedInner::Logistic(m) => m.predict_proba(&x),
            FittedInner::Forest(m) => m.predict_score(&x),
        })
    }
}
