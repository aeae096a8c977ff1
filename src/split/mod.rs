//! Holdout and k-fold splitting
//!
//! Partitions are pseudo-random and fully determined by an explicit seed.
//! Repeated k-fold derives one sub-seed per repeat so the repeats are
//! independent shuffles but the whole sequence is reproducible.

use crate::dataset::Dataset;
use crate::error::{EvalError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// One (train, validation) pair of a k-fold split
///
/// Holds row indices into the source dataset; [`Fold::materialize`] copies
/// the rows out when the actual subsets are needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fold {
    pub repeat: usize,
    pub fold_idx: usize,
    pub train_indices: Vec<usize>,
    pub validation_indices: Vec<usize>,
}

impl Fold {
    /// Copy the train and validation rows out of the source dataset
    pub fn materialize(&self, dataset: &Dataset) -> Result<(Dataset, Dataset)> {
        Ok((
            dataset.take(&self.train_indices)?,
            dataset.take(&self.validation_indices)?,
        ))
    }
}

/// Partition a dataset into disjoint train and test subsets
///
/// `len(train) = round(train_fraction * n)`; deterministic for a fixed seed.
pub fn holdout_split(
    dataset: &Dataset,
    train_fraction: f64,
    seed: u64,
) -> Result<(Dataset, Dataset)> {
    let (train_idx, test_idx) = holdout_indices(dataset.n_rows(), train_fraction, seed)?;
    Ok((dataset.take(&train_idx)?, dataset.take(&test_idx)?))
}

/// Index-level holdout partition
pub fn holdout_indices(
    n: usize,
    train_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(EvalError::invalid_parameter(
            "train_fraction",
            train_fraction,
            "must be strictly between 0 and 1",
        ));
    }
    let n_train = (n as f64 * train_fraction).round() as usize;
    if n_train == 0 || n_train == n {
        return Err(EvalError::InsufficientData {
            needed: 2,
            available: n,
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices.split_off(n_train);
    Ok((indices, test))
}

/// Produce `k * repeats` (train, validation) folds
///
/// Within one repeat the validation sets are disjoint and their union is the
/// full dataset. Fold sizes differ by at most one record.
pub fn kfold_split(n: usize, k: usize, repeats: usize, seed: u64) -> Result<Vec<Fold>> {
    if k < 2 {
        return Err(EvalError::invalid_parameter("k", k, "must be at least 2"));
    }
    if repeats < 1 {
        return Err(EvalError::invalid_parameter(
            "repeats",
            repeats,
            "must be at least 1",
        ));
    }
    if n < k {
        return Err(EvalError::invalid_parameter(
            "k",
            k,
            format!("must not exceed the number of records ({n})"),
        ));
    }

    let mut folds = Vec::with_capacity(k * repeats);
    for repeat in 0..repeats {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(repeat as u64));
        indices.shuffle(&mut rng);

        // Spread the remainder over the first folds
        let base = n / k;
        let remainder = n % k;
        let mut start = 0;
        for fold_idx in 0..k {
            let size = if fold_idx < remainder { base + 1 } else { base };
            let validation_indices: Vec<usize> = indices[start..start + size].to_vec();
            let train_indices: Vec<usize> = indices[..start]
                .iter()
                .chain(indices[start + size..].iter())
                .copied()
                .collect();
            folds.push(Fold {
                repeat,
                fold_idx,
                train_indices,
                validation_indices,
            });
            start += size;
        }
    }

    Ok(folds)
}
