//! Ranked model comparison
//!
//! Pure aggregation of per-model scores into a ranked table. The null
//! baseline is always the first row regardless of where it ranks; the
//! remaining rows sort by the metric's own direction, with unavailable
//! entries (every fold failed) last.

use crate::error::{EvalError, Result};
use crate::score::MetricKind;
use serde::{Deserialize, Serialize};

/// One model's aggregated result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub label: String,
    pub metric: MetricKind,
    /// Mean score over successful folds; None when every fold failed
    pub value: Option<f64>,
    /// Optional bootstrap confidence interval
    pub interval: Option<(f64, f64)>,
    /// Number of (model, fold) pairs requested for this model
    pub folds_total: usize,
    /// How many of those pairs failed to fit or score
    pub folds_failed: usize,
    /// Marks the null/reference model
    pub baseline: bool,
}

impl ComparisonEntry {
    pub fn new(label: impl Into<String>, metric: MetricKind, value: Option<f64>) -> Self {
        Self {
            label: label.into(),
            metric,
            value,
            interval: None,
            folds_total: 1,
            folds_failed: 0,
            baseline: false,
        }
    }

    pub fn with_interval(mut self, interval: (f64, f64)) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_folds(mut self, total: usize, failed: usize) -> Self {
        self.folds_total = total;
        self.folds_failed = failed;
        self
    }

    pub fn as_baseline(mut self) -> Self {
        self.baseline = true;
        self
    }

    /// True when no fold produced a usable score
    pub fn is_unavailable(&self) -> bool {
        self.value.is_none()
    }
}

/// Ranked comparison of all requested models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub metric: MetricKind,
    pub rows: Vec<ComparisonEntry>,
}

impl ComparisonTable {
    /// The best-ranked non-baseline row with an available score
    pub fn best(&self) -> Option<&ComparisonEntry> {
        self.rows
            .iter()
            .find(|row| !row.baseline && !row.is_unavailable())
    }

    /// Baseline (reference) row
    pub fn baseline(&self) -> Option<&ComparisonEntry> {
        self.rows.iter().find(|row| row.baseline)
    }
}

/// Rank entries into a comparison table
///
/// All entries must carry the same metric kind.
pub fn compare(entries: Vec<ComparisonEntry>) -> Result<ComparisonTable> {
    let metric = entries
        .first()
        .map(|e| e.metric)
        .ok_or_else(|| EvalError::DataError("cannot compare an empty entry list".to_string()))?;

    if let Some(bad) = entries.iter().find(|e| e.metric != metric) {
        return Err(EvalError::DataError(format!(
            "mixed metrics in comparison: {} vs {}",
            metric.name(),
            bad.metric.name()
        )));
    }

    let (mut baseline_rows, mut model_rows): (Vec<_>, Vec<_>) =
        entries.into_iter().partition(|e| e.baseline);

    model_rows.sort_by(|a, b| match (a.value, b.value) {
        (Some(va), Some(vb)) => {
            let ordering = va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal);
            if metric.higher_is_better() {
                ordering.reverse()
            } else {
                ordering
            }
        }
        // Unavailable rows sort last
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    baseline_rows.extend(model_rows);
    Ok(ComparisonTable {
        metric,
        rows: baseline_rows,
    })
}
