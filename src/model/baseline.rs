//! Null/baseline model
//!
//! Predicts the training mean (regression) or training mode (classification)
//! for every record, regardless of predictors. Every other model is compared
//! against this floor.

use crate::error::{EvalError, Result};
use crate::model::TaskKind;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fitted constant predictor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NullModel {
    pub value: f64,
}

impl NullModel {
    pub fn fit(y: &Array1<f64>, task: TaskKind) -> Result<Self> {
        if y.is_empty() {
            return Err(EvalError::InsufficientData {
                needed: 1,
                available: 0,
            });
        }
        let value = match task {
            TaskKind::Regression => y.mean().unwrap_or(0.0),
            TaskKind::Classification => {
                let mut counts: HashMap<i64, usize> = HashMap::new();
                for &v in y.iter() {
                    *counts.entry(v.round() as i64).or_insert(0) += 1;
                }
                // Ties break toward the smaller label
                counts
                    .into_iter()
                    .max_by_key(|&(label, c)| (c, std::cmp::Reverse(label)))
                    .map(|(label, _)| label as f64)
                    .unwrap_or(0.0)
            }
        };
        Ok(Self { value })
    }

    pub fn predict(&self, n: usize) -> Array1<f64> {
        Array1::from_elem(n, self.value)
    }
}
