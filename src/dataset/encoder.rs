//! Categorical encoding for design matrices
//!
//! The encoding is learned once on the training subset and reapplied
//! unchanged to every other subset, so train and test rows always expand
//! into the same indicator columns. Categories never seen during fitting
//! map to an all-zero indicator block.

use crate::error::{EvalError, Result};
use crate::dataset::{Column, Dataset};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One feature slot in the fitted encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
enum FeatureSlot {
    /// Numeric column passed through as-is
    Numeric { column: String },
    /// Indicator columns, one per category level seen during fitting
    Indicator { column: String, levels: Vec<String> },
}

/// One-hot encoder fitted on a training subset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    slots: Vec<FeatureSlot>,
    n_features: usize,
}

impl OneHotEncoder {
    /// Learn the encoding from the training subset
    pub fn fit(train: &Dataset, predictors: &[String]) -> Result<Self> {
        let mut slots = Vec::with_capacity(predictors.len());
        let mut n_features = 0;

        for name in predictors {
            match train.column(name)? {
                Column::Numeric(_) => {
                    slots.push(FeatureSlot::Numeric {
                        column: name.clone(),
                    });
                    n_features += 1;
                }
                Column::Categorical(values) => {
                    let mut levels: Vec<String> = values.to_vec();
                    levels.sort();
                    levels.dedup();
                    if levels.is_empty() {
                        return Err(EvalError::DataError(format!(
                            "categorical column '{name}' has no levels"
                        )));
                    }
                    n_features += levels.len();
                    slots.push(FeatureSlot::Indicator {
                        column: name.clone(),
                        levels,
                    });
                }
            }
        }

        Ok(Self { slots, n_features })
    }

    /// Number of columns in the encoded design matrix
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Encoded feature names, in design-matrix column order
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_features);
        for slot in &self.slots {
            match slot {
                FeatureSlot::Numeric { column } => names.push(column.clone()),
                FeatureSlot::Indicator { column, levels } => {
                    for level in levels {
                        names.push(format!("{column}_{level}"));
                    }
                }
            }
        }
        names
    }

    /// Apply the fitted encoding to any subset
    pub fn transform(&self, dataset: &Dataset) -> Result<Array2<f64>> {
        let n = dataset.n_rows();
        let mut matrix = Array2::zeros((n, self.n_features));
        let mut col_offset = 0;

        for slot in &self.slots {
            match slot {
                FeatureSlot::Numeric { column } => {
                    let values = dataset.numeric(column)?;
                    for (row, &v) in values.iter().enumerate() {
                        matrix[[row, col_offset]] = v;
                    }
                    col_offset += 1;
                }
                FeatureSlot::Indicator { column, levels } => {
                    let values = match dataset.column(column)? {
                        Column::Categorical(v) => v,
                        Column::Numeric(_) => {
                            return Err(EvalError::DataError(format!(
                                "column '{column}' was categorical at fit time, numeric now"
                            )))
                        }
                    };
                    for (row, value) in values.iter().enumerate() {
                        // Unseen categories leave the whole block at zero
                        if let Some(level_idx) = levels.iter().position(|l| l == value) {
                            matrix[[row, col_offset + level_idx]] = 1.0;
                        }
                    }
                    col_offset += levels.len();
                }
            }
        }

        Ok(matrix)
    }
}
