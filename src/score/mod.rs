//! Evaluation metrics
//!
//! Each metric knows its ranking direction so the comparator can sort
//! without special cases. Metrics that are undefined for the given data
//! (zero-variance truth, single-class labels) fail with `DegenerateMetric`
//! instead of returning a misleading number.

use crate::error::{EvalError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Metric family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// Root mean squared error (regression, lower is better)
    Rmse,
    /// Coefficient of determination (regression, higher is better)
    R2,
    /// Mean absolute error (regression, lower is better)
    Mae,
    /// Fraction of exact label matches (classification, higher is better)
    Accuracy,
    /// Area under the ROC curve (classification, higher is better)
    RocAuc,
}

impl MetricKind {
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::Rmse => "RMSE",
            MetricKind::R2 => "R2",
            MetricKind::Mae => "MAE",
            MetricKind::Accuracy => "Accuracy",
            MetricKind::RocAuc => "ROC-AUC",
        }
    }

    /// Ranking direction: false means ascending (error metric)
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, MetricKind::Rmse | MetricKind::Mae)
    }

    /// Whether the metric consumes continuous scores rather than hard labels
    pub fn uses_scores(&self) -> bool {
        matches!(self, MetricKind::RocAuc)
    }
}

/// A named scalar produced by scoring one model on one evaluation subset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub kind: MetricKind,
    pub value: f64,
}

/// Score predictions against truth with the requested metric
pub fn score(predictions: &Array1<f64>, truth: &Array1<f64>, kind: MetricKind) -> Result<Metric> {
    if predictions.len() != truth.len() {
        return Err(EvalError::ShapeError {
            expected: format!("{} predictions", truth.len()),
            actual: format!("{} predictions", predictions.len()),
        });
    }
    if truth.is_empty() {
        return Err(EvalError::DegenerateMetric(
            "cannot score an empty evaluation set".to_string(),
        ));
    }

    let value = match kind {
        MetricKind::Rmse => rmse(predictions, truth),
        MetricKind::Mae => mae(predictions, truth),
        MetricKind::R2 => r2(predictions, truth)?,
        MetricKind::Accuracy => accuracy(predictions, truth),
        MetricKind::RocAuc => roc_auc(predictions, truth)?,
    };

    Ok(Metric { kind, value })
}

fn rmse(predictions: &Array1<f64>, truth: &Array1<f64>) -> f64 {
    let n = truth.len() as f64;
    let sse: f64 = predictions
        .iter()
        .zip(truth.iter())
        .map(|(p, t)| (p - t).powi(2))
        .sum();
    (sse / n).sqrt()
}

fn mae(predictions: &Array1<f64>, truth: &Array1<f64>) -> f64 {
    let n = truth.len() as f64;
    predictions
        .iter()
        .zip(truth.iter())
        .map(|(p, t)| (p - t).abs())
        .sum::<f64>()
        / n
}

fn r2(predictions: &Array1<f64>, truth: &Array1<f64>) -> Result<f64> {
    let mean = truth.mean().unwrap_or(0.0);
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return Err(EvalError::DegenerateMetric(
            "R2 is undefined when the truth has zero variance".to_string(),
        ));
    }
    let ss_res: f64 = predictions
        .iter()
        .zip(truth.iter())
        .map(|(p, t)| (p - t).powi(2))
        .sum();
    Ok(1.0 - ss_res / ss_tot)
}

fn accuracy(predictions: &Array1<f64>, truth: &Array1<f64>) -> f64 {
    let correct = predictions
        .iter()
        .zip(truth.iter())
        .filter(|(p, t)| p.round() as i64 == t.round() as i64)
        .count();
    correct as f64 / truth.len() as f64
}

/// Rank-based AUC (Mann-Whitney statistic) with midranks for tied scores
fn roc_auc(scores: &Array1<f64>, truth: &Array1<f64>) -> Result<f64> {
    let n = truth.len();
    let n_pos = truth.iter().filter(|&&t| t > 0.5).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(EvalError::DegenerateMetric(
            "ROC-AUC requires at least one record of each class".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Assign midranks over runs of tied scores
    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let midrank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = midrank;
        }
        i = j + 1;
    }

    let rank_sum_pos: f64 = (0..n).filter(|&i| truth[i] > 0.5).map(|i| ranks[i]).sum();
    let u = rank_sum_pos - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Ok(u / (n_pos * n_neg) as f64)
}
