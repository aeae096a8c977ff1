//! Integration test: evaluation pipeline end-to-end

use tabeval::prelude::*;

/// 120 pharmacokinetic-style records: concentration driven by dose with a
/// small deterministic perturbation, dose taking three levels.
fn dose_dataset() -> Dataset {
    let levels = [25.0, 37.5, 50.0];
    let mut dose = Vec::with_capacity(120);
    let mut concentration = Vec::with_capacity(120);
    for i in 0..120 {
        let d = levels[i % 3];
        let wobble = ((i * 13) % 17) as f64 * 0.2 - 1.6;
        dose.push(d);
        concentration.push(2.0 * d + wobble);
    }
    Dataset::new()
        .with_numeric("dose", dose)
        .unwrap()
        .with_numeric("concentration", concentration)
        .unwrap()
}

fn binary_dataset() -> Dataset {
    let mut x = Vec::with_capacity(100);
    let mut label = Vec::with_capacity(100);
    for i in 0..100 {
        let v = (i % 50) as f64 * 0.2;
        x.push(v);
        label.push(if v > 5.0 { 1.0 } else { 0.0 });
    }
    Dataset::new()
        .with_numeric("x", x)
        .unwrap()
        .with_numeric("label", label)
        .unwrap()
}

#[test]
fn test_scenario_linear_beats_null_with_three_distinct_predictions() {
    let ds = dose_dataset();

    let linear = ModelSpec::linear("conc ~ dose", "concentration", vec!["dose".to_string()]);
    let fitted = linear.fit(&ds).unwrap();
    let predictions = fitted.predict(&ds).unwrap();
    assert_eq!(predictions.len(), 120);

    // The sole predictor takes three values, so predictions must too
    let mut distinct: Vec<f64> = predictions.to_vec();
    distinct.sort_by(|a, b| a.partial_cmp(b).unwrap());
    distinct.dedup();
    assert_eq!(distinct.len(), 3, "expected exactly 3 distinct predictions");

    let truth = ds.outcome("concentration").unwrap();
    let linear_rmse = score(&predictions, &truth, MetricKind::Rmse).unwrap().value;

    let null = ModelSpec::null("null", "concentration", TaskKind::Regression);
    let null_preds = null.fit(&ds).unwrap().predict(&ds).unwrap();
    let null_rmse = score(&null_preds, &truth, MetricKind::Rmse).unwrap().value;

    assert!(
        linear_rmse < null_rmse,
        "dose model ({linear_rmse}) must beat the null floor ({null_rmse})"
    );
}

#[test]
fn test_scenario_holdout_split_sizes() {
    let ds = dose_dataset();
    let (train, test) = holdout_split(&ds, 0.75, 1234).unwrap();
    assert_eq!(train.n_rows(), 90);
    assert_eq!(test.n_rows(), 30);
}

#[test]
fn test_scenario_repeated_kfold_counts() {
    let ds = dose_dataset();
    let (train, _) = holdout_split(&ds, 0.75, 1234).unwrap();
    assert_eq!(train.n_rows(), 90);

    let folds = kfold_split(train.n_rows(), 5, 5, 42).unwrap();
    assert_eq!(folds.len(), 25);
    for fold in &folds {
        assert_eq!(fold.validation_indices.len(), 18);
        assert_eq!(fold.train_indices.len(), 72);
    }
}

#[test]
fn test_scenario_bootstrap_summary() {
    let ds = dose_dataset();
    let (train, _) = holdout_split(&ds, 0.75, 1234).unwrap();
    let spec = ModelSpec::linear("conc ~ dose", "concentration", vec!["dose".to_string()]);

    let summary = bootstrap(&train, &spec, 100, 42).unwrap();
    assert_eq!(summary.rows.len(), 90);
    assert_eq!(summary.n_draws, 100);
    for row in &summary.rows {
        assert!(row.lower <= row.mean + 1e-9, "lower {} mean {}", row.lower, row.mean);
        assert!(row.mean <= row.upper + 1e-9, "mean {} upper {}", row.mean, row.upper);
        assert!(row.lower <= row.median && row.median <= row.upper);
    }
}

#[test]
fn test_kfold_validation_sets_partition_dataset() {
    let ds = dose_dataset();
    let folds = kfold_split(ds.n_rows(), 6, 1, 7).unwrap();

    let mut seen: Vec<usize> = folds
        .iter()
        .flat_map(|f| f.validation_indices.clone())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..120).collect::<Vec<_>>());
}

#[test]
fn test_regression_comparison_ranks_models() {
    let ds = dose_dataset();
    let specs = vec![
        ModelSpec::linear("ols", "concentration", vec!["dose".to_string()]),
        ModelSpec::lasso("lasso", "concentration", vec!["dose".to_string()], 0.1),
        ModelSpec::forest(
            "forest",
            "concentration",
            vec!["dose".to_string()],
            TaskKind::Regression,
            ForestConfig::new(30).with_min_samples_leaf(2).with_seed(9),
        ),
    ];
    let config = EvalConfig::new().with_k(5).with_seed(21);

    let table = evaluate_kfold(&ds, &specs, MetricKind::Rmse, &config).unwrap();
    assert_eq!(table.rows.len(), 4, "three models plus the null baseline");
    assert!(table.rows[0].baseline, "baseline row comes first");

    let null_rmse = table.baseline().unwrap().value.unwrap();
    for row in table.rows.iter().filter(|r| !r.baseline) {
        let rmse = row.value.expect("all folds should succeed");
        assert!(
            rmse < null_rmse,
            "{} ({rmse}) should beat the null floor ({null_rmse})",
            row.label
        );
    }

    // Sorted ascending after the baseline
    let values: Vec<f64> = table
        .rows
        .iter()
        .skip(1)
        .map(|r| r.value.unwrap())
        .collect();
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_classification_comparison_with_auc() {
    let ds = binary_dataset();
    let specs = vec![
        ModelSpec::logistic("logistic", "label", vec!["x".to_string()]),
        ModelSpec::forest(
            "forest",
            "label",
            vec!["x".to_string()],
            TaskKind::Classification,
            ForestConfig::new(25).with_seed(3),
        ),
    ];
    let config = EvalConfig::new().with_k(5).with_seed(8);

    let accuracy = evaluate_kfold(&ds, &specs, MetricKind::Accuracy, &config).unwrap();
    let best_accuracy = accuracy.best().unwrap().value.unwrap();
    let null_accuracy = accuracy.baseline().unwrap().value.unwrap();
    assert!(best_accuracy > null_accuracy);
    assert!(best_accuracy > 0.9, "separable data: got {best_accuracy}");

    let auc = evaluate_kfold(&ds, &specs, MetricKind::RocAuc, &config).unwrap();
    let best_auc = auc.best().unwrap().value.unwrap();
    assert!(best_auc > 0.9, "separable data: got {best_auc}");
}

#[test]
fn test_pipeline_deterministic_end_to_end() {
    let ds = dose_dataset();
    let specs = vec![ModelSpec::linear(
        "ols",
        "concentration",
        vec!["dose".to_string()],
    )];
    let config = EvalConfig::new().with_k(4).with_seed(123);

    let a = evaluate_kfold(&ds, &specs, MetricKind::R2, &config).unwrap();
    let b = evaluate_kfold(&ds, &specs, MetricKind::R2, &config).unwrap();
    assert_eq!(a.best().unwrap().value, b.best().unwrap().value);

    let other_seed = EvalConfig::new().with_k(4).with_seed(124);
    let c = evaluate_kfold(&ds, &specs, MetricKind::R2, &other_seed).unwrap();
    assert_ne!(
        a.best().unwrap().value,
        c.best().unwrap().value,
        "different seeds should shuffle folds differently"
    );
}

#[test]
fn test_comparison_table_serializes() {
    let ds = dose_dataset();
    let specs = vec![ModelSpec::linear(
        "ols",
        "concentration",
        vec!["dose".to_string()],
    )];
    let config = EvalConfig::new();

    let table = evaluate_kfold(&ds, &specs, MetricKind::Rmse, &config).unwrap();
    let json = serde_json::to_string_pretty(&table).unwrap();
    assert!(json.contains("\"ols\""));

    let back: ComparisonTable = serde_json::from_str(&json).unwrap();
    assert_eq!(back.rows.len(), table.rows.len());
}
