//! Bootstrap resampling
//!
//! Draws B samples with replacement from a training subset, refits the model
//! spec on each, and applies every refit to the original training subset.
//! Because the evaluation set is fixed, per-record predictions are directly
//! comparable across models. Draw `d` seeds its own RNG from `seed + d`, so
//! any individual draw is reproducible in isolation and results do not
//! depend on execution order.

use crate::dataset::Dataset;
use crate::error::{EvalError, Result};
use crate::model::ModelSpec;
use crate::score::{self, MetricKind};
use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Prediction spread for one record across all bootstrap refits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResampleRow {
    /// 2.5th percentile
    pub lower: f64,
    /// 50th percentile
    pub median: f64,
    /// 97.5th percentile
    pub upper: f64,
    pub mean: f64,
}

/// Per-record bootstrap summary, one row per training record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampleSummary {
    pub rows: Vec<ResampleRow>,
    pub n_draws: usize,
}

/// Bootstrap a model spec on a training subset
///
/// A failed refit aborts the whole call: failures are deterministic for a
/// given seed, so partial summaries would be misleading and retrying the
/// same seed is pointless.
pub fn bootstrap(
    train: &Dataset,
    spec: &ModelSpec,
    n_draws: usize,
    seed: u64,
) -> Result<ResampleSummary> {
    if n_draws < 1 {
        return Err(EvalError::invalid_parameter(
            "n_draws",
            n_draws,
            "must be at least 1",
        ));
    }
    let n = train.n_rows();
    if n == 0 {
        return Err(EvalError::InsufficientData {
            needed: 1,
            available: 0,
        });
    }

    let predictions = predict_draws(train, spec, n_draws, seed)?;

    let rows = (0..n)
        .map(|record| {
            let mut values: Vec<f64> = predictions.iter().map(|p| p[record]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            ResampleRow {
                lower: quantile(&values, 0.025),
                median: quantile(&values, 0.5),
                upper: quantile(&values, 0.975),
                mean,
            }
        })
        .collect();

    Ok(ResampleSummary { rows, n_draws })
}

/// Bootstrap interval for a model-level metric
///
/// Each refit is scored on the original training subset; the returned pair
/// is the (2.5th, 97.5th) percentile of the B metric values.
pub fn bootstrap_metric_interval(
    train: &Dataset,
    spec: &ModelSpec,
    metric: MetricKind,
    n_draws: usize,
    seed: u64,
) -> Result<(f64, f64)> {
    if n_draws < 1 {
        return Err(EvalError::invalid_parameter(
            "n_draws",
            n_draws,
            "must be at least 1",
        ));
    }

    let truth = train.outcome(&spec.outcome)?;
    let predictions = predict_draws(train, spec, n_draws, seed)?;

    let mut values: Vec<f64> = predictions
        .iter()
        .map(|p| score::score(p, &truth, metric).map(|m| m.value))
        .collect::<Result<_>>()?;
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Ok((quantile(&values, 0.025), quantile(&values, 0.975)))
}

/// Refit on each bootstrap sample and predict the fixed evaluation set
fn predict_draws(
    train: &Dataset,
    spec: &ModelSpec,
    n_draws: usize,
    seed: u64,
) -> Result<Vec<Array1<f64>>> {
    let n = train.n_rows();

    (0..n_draws)
        .into_par_iter()
        .map(|draw| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(draw as u64));
            let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let sample = train.take(&indices)?;
            let fitted = spec.fit(&sample)?;
            fitted.predict(train)
        })
        .collect()
}

/// Quantile with linear interpolation between order statistics
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let position = q * (sorted.len() - 1) as f64;
    let low = position.floor() as usize;
    let high = position.ceil() as usize;
    if low == high {
        sorted[low]
    } else {
        let weight = position - low as f64;
        sorted[low] * (1.0 - weight) + sorted[high] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelSpec;

    fn linear_dataset(n: usize) -> Dataset {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0 + (v % 3.0) * 0.1).collect();
        Dataset::new()
            .with_numeric("x", x)
            .unwrap()
            .with_numeric("y", y)
            .unwrap()
    }

    #[test]
    fn test_summary_shape_and_monotone_quantiles() {
        let ds = linear_dataset(40);
        let spec = ModelSpec::linear("y ~ x", "y", vec!["x".to_string()]);
        let summary = bootstrap(&ds, &spec, 50, 42).unwrap();

        assert_eq!(summary.rows.len(), 40);
        assert_eq!(summary.n_draws, 50);
        for row in &summary.rows {
            assert!(row.lower <= row.median + 1e-12);
            assert!(row.median <= row.upper + 1e-12);
            assert!(row.lower <= row.mean + 1e-12 && row.mean <= row.upper + 1e-12);
        }
    }

    #[test]
    fn test_deterministic_per_seed() {
        let ds = linear_dataset(25);
        let spec = ModelSpec::linear("y ~ x", "y", vec!["x".to_string()]);

        let a = bootstrap(&ds, &spec, 30, 7).unwrap();
        let b = bootstrap(&ds, &spec, 30, 7).unwrap();
        for (ra, rb) in a.rows.iter().zip(b.rows.iter()) {
            assert_eq!(ra.median, rb.median);
            assert_eq!(ra.mean, rb.mean);
        }
    }

    #[test]
    fn test_zero_draws_rejected() {
        let ds = linear_dataset(10);
        let spec = ModelSpec::linear("y ~ x", "y", vec!["x".to_string()]);
        assert!(matches!(
            bootstrap(&ds, &spec, 0, 1),
            Err(EvalError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_metric_interval_ordered() {
        let ds = linear_dataset(30);
        let spec = ModelSpec::linear("y ~ x", "y", vec!["x".to_string()]);
        let (lower, upper) =
            bootstrap_metric_interval(&ds, &spec, MetricKind::Rmse, 40, 3).unwrap();
        assert!(lower <= upper);
        assert!(lower >= 0.0);
    }

    #[test]
    fn test_quantile_interpolation() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.0), 1.0);
        assert_eq!(quantile(&values, 1.0), 4.0);
        assert_eq!(quantile(&values, 0.5), 2.5);
    }
}
