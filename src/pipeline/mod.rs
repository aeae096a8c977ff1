//! Evaluation pipeline orchestration
//!
//! Wires the splitter, fitter, scorer, resampler, and comparator together.
//! Every (model, fold) pair is fit and scored independently; a failed pair
//! never aborts the run — it is counted and surfaced through the comparison
//! table so the output accounts for every requested pair. All randomized
//! steps derive their sub-seeds from the single seed in [`EvalConfig`], so a
//! run is reproducible regardless of thread count or execution order.

use crate::compare::{self, ComparisonEntry, ComparisonTable};
use crate::dataset::Dataset;
use crate::error::{EvalError, Result};
use crate::model::{ModelSpec, TaskKind};
use crate::resample;
use crate::score::{self, MetricKind};
use crate::split::{self, Fold};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Fraction of records assigned to the training side of a holdout split
    pub train_fraction: f64,
    /// Number of cross-validation folds
    pub k: usize,
    /// Number of k-fold repetitions
    pub repeats: usize,
    /// Bootstrap draws for confidence intervals (0 disables intervals)
    pub n_bootstrap: usize,
    /// Master seed; all sub-seeds are derived from it
    pub seed: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.75,
            k: 5,
            repeats: 1,
            n_bootstrap: 0,
            seed: 42,
        }
    }
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_train_fraction(mut self, fraction: f64) -> Self {
        self.train_fraction = fraction;
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn with_bootstrap(mut self, n_draws: usize) -> Self {
        self.n_bootstrap = n_draws;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// K-fold cross-validated comparison of the given model specs
///
/// Produces `k * repeats` (train, validation) pairs and scores every spec on
/// every pair. Per-model scores are averaged over the successful pairs. A
/// null baseline for the first spec's outcome is appended automatically when
/// the caller did not include one.
pub fn evaluate_kfold(
    dataset: &Dataset,
    specs: &[ModelSpec],
    metric: MetricKind,
    config: &EvalConfig,
) -> Result<ComparisonTable> {
    let specs = with_baseline(specs)?;
    let folds = split::kfold_split(dataset.n_rows(), config.k, config.repeats, config.seed)?;
    debug!(
        n_models = specs.len(),
        n_folds = folds.len(),
        metric = metric.name(),
        "starting k-fold evaluation"
    );

    let entries: Vec<ComparisonEntry> = specs
        .par_iter()
        .map(|spec| {
            let scores: Vec<Option<f64>> = folds
                .par_iter()
                .map(|fold| score_pair(dataset, spec, fold, metric))
                .collect();
            aggregate(spec, metric, &scores)
        })
        .collect();

    compare::compare(entries)
}

/// Single holdout comparison
///
/// When `config.n_bootstrap > 0`, each model's row also carries a bootstrap
/// confidence interval for the metric, computed on the training subset.
pub fn evaluate_holdout(
    dataset: &Dataset,
    specs: &[ModelSpec],
    metric: MetricKind,
    config: &EvalConfig,
) -> Result<ComparisonTable> {
    let specs = with_baseline(specs)?;
    let (train, test) = split::holdout_split(dataset, config.train_fraction, config.seed)?;
    debug!(
        n_train = train.n_rows(),
        n_test = test.n_rows(),
        "starting holdout evaluation"
    );

    let entries: Vec<ComparisonEntry> = specs
        .par_iter()
        .map(|spec| {
            let value = fit_and_score(spec, &train, &test, metric)
                .map_err(|err| {
                    warn!(model = %spec.label, %err, "holdout fit/score failed");
                    err
                })
                .ok();
            let mut entry = base_entry(spec, metric, value, 1, usize::from(value.is_none()));

            if config.n_bootstrap > 0 && value.is_some() {
                match resample::bootstrap_metric_interval(
                    &train,
                    spec,
                    metric,
                    config.n_bootstrap,
                    config.seed,
                ) {
                    Ok(interval) => entry = entry.with_interval(interval),
                    // The point estimate stands; only the interval is lost
                    Err(err) => warn!(model = %spec.label, %err, "bootstrap interval failed"),
                }
            }
            entry
        })
        .collect();

    compare::compare(entries)
}

/// In-sample comparison: fit and score on the same records
///
/// Optimistic by construction — in-sample error says nothing about
/// generalization. Kept only as an explicitly labeled diagnostic; never
/// treat its favorable metrics as evidence of predictive power.
pub fn evaluate_in_sample(
    dataset: &Dataset,
    specs: &[ModelSpec],
    metric: MetricKind,
) -> Result<ComparisonTable> {
    let specs = with_baseline(specs)?;

    let entries: Vec<ComparisonEntry> = specs
        .par_iter()
        .map(|spec| {
            let value = fit_and_score(spec, dataset, dataset, metric)
                .map_err(|err| {
                    warn!(model = %spec.label, %err, "in-sample fit/score failed");
                    err
                })
                .ok();
            base_entry(spec, metric, value, 1, usize::from(value.is_none()))
        })
        .collect();

    compare::compare(entries)
}

/// Append a null baseline when the spec list has none
fn with_baseline(specs: &[ModelSpec]) -> Result<Vec<ModelSpec>> {
    let first = specs.first().ok_or_else(|| {
        EvalError::DataError("at least one model spec is required".to_string())
    })?;

    let mut all = specs.to_vec();
    if !all.iter().any(|s| matches!(s.family, crate::model::ModelFamily::Null)) {
        let label = match first.task {
            TaskKind::Regression => "null (training mean)",
            TaskKind::Classification => "null (training mode)",
        };
        all.push(ModelSpec::null(label, first.outcome.clone(), first.task));
    }
    Ok(all)
}

fn fit_and_score(
    spec: &ModelSpec,
    train: &Dataset,
    eval: &Dataset,
    metric: MetricKind,
) -> Result<f64> {
    let fitted = spec.fit(train)?;
    let predictions = if metric.uses_scores() {
        fitted.predict_score(eval)?
    } else {
        fitted.predict(eval)?
    };
    let truth = eval.outcome(&spec.outcome)?;
    Ok(score::score(&predictions, &truth, metric)?.value)
}

fn score_pair(
    dataset: &Dataset,
    spec: &ModelSpec,
    fold: &Fold,
    metric: MetricKind,
) -> Option<f64> {
    let outcome = fold
        .materialize(dataset)
        .and_then(|(train, validation)| fit_and_score(spec, &train, &validation, metric));
    match outcome {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                model = %spec.label,
                repeat = fold.repeat,
                fold = fold.fold_idx,
                %err,
                "fold fit/score failed"
            );
            None
        }
    }
}

fn aggregate(
    spec: &ModelSpec,
    metric: MetricKind,
    scores: &[Option<f64>],
) -> ComparisonEntry {
    let successes: Vec<f64> = scores.iter().flatten().copied().collect();
    let failed = scores.len() - successes.len();
    let value = if successes.is_empty() {
        None
    } else {
        Some(successes.iter().sum::<f64>() / successes.len() as f64)
    };
    base_entry(spec, metric, value, scores.len(), failed)
}

fn base_entry(
    spec: &ModelSpec,
    metric: MetricKind,
    value: Option<f64>,
    total: usize,
    failed: usize,
) -> ComparisonEntry {
    let entry = ComparisonEntry::new(spec.label.clone(), metric, value).with_folds(total, failed);
    if matches!(spec.family, crate::model::ModelFamily::Null) {
        entry.as_baseline()
    } else {
        entry
    }
}
