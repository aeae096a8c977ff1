//! Linear least-squares models: OLS and L1-regularized (LASSO)

use crate::error::{EvalError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Fitted linear model parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub coefficients: Array1<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }
}

/// Cholesky solve of the symmetric system Ax = b
///
/// Retries once with a small diagonal bump when the matrix is not positive
/// definite; returns None when even the bumped system fails.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    match try_cholesky(a, b) {
        Some(x) => Some(x),
        None => {
            let n = a.nrows();
            let bump = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
            let mut bumped = a.clone();
            for i in 0..n {
                bumped[[i, i]] += bump.max(1e-12);
            }
            try_cholesky(&bumped, b)
        }
    }
}

fn try_cholesky(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, i]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b, then L^T x = y
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * y[j]).sum();
        y[i] = (b[i] - sum) / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (y[i] - sum) / l[[i, i]];
    }
    Some(x)
}

/// Gauss-Jordan solve, used when Cholesky fails outright
fn gauss_jordan_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut aug = Array2::<f64>::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        // Partial pivoting
        let mut pivot_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[pivot_row, col]].abs() {
                pivot_row = row;
            }
        }
        if aug[[pivot_row, col]].abs() < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for j in 0..=n {
                let tmp = aug[[col, j]];
                aug[[col, j]] = aug[[pivot_row, j]];
                aug[[pivot_row, j]] = tmp;
            }
        }

        let pivot = aug[[col, col]];
        for j in 0..=n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..=n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    Some(Array1::from_iter((0..n).map(|i| aug[[i, n]])))
}

fn center(x: &Array2<f64>, y: &Array1<f64>) -> (Array2<f64>, Array1<f64>, Array1<f64>, f64) {
    let x_mean = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let y_mean = y.mean().unwrap_or(0.0);
    let x_centered = x - &x_mean.clone().insert_axis(Axis(0));
    let y_centered = y - y_mean;
    (x_centered, y_centered, x_mean, y_mean)
}

/// Ordinary least squares via the normal equations
pub fn fit_ols(x: &Array2<f64>, y: &Array1<f64>) -> Result<LinearModel> {
    let (x_c, y_c, x_mean, y_mean) = center(x, y);

    let xtx = x_c.t().dot(&x_c);
    let xty = x_c.t().dot(&y_c);

    let coefficients = cholesky_solve(&xtx, &xty)
        .or_else(|| gauss_jordan_solve(&xtx, &xty))
        .ok_or_else(|| {
            EvalError::ComputationError("design matrix is singular, cannot solve OLS".to_string())
        })?;

    let intercept = y_mean - coefficients.dot(&x_mean);
    Ok(LinearModel {
        coefficients,
        intercept,
    })
}

/// L1-regularized least squares via cyclic coordinate descent
pub fn fit_lasso(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> Result<LinearModel> {
    const MAX_ITER: usize = 1000;
    const TOL: f64 = 1e-6;

    let n_samples = x.nrows();
    let n_features = x.ncols();
    let (x_c, y_c, x_mean, y_mean) = center(x, y);

    let col_norms: Vec<f64> = (0..n_features)
        .map(|j| x_c.column(j).mapv(|v| v * v).sum())
        .collect();

    let mut w = Array1::<f64>::zeros(n_features);
    let mut residual = y_c.clone();
    let lambda = alpha * n_samples as f64;

    for _ in 0..MAX_ITER {
        let mut max_delta = 0.0f64;
        for j in 0..n_features {
            if col_norms[j] < 1e-15 {
                w[j] = 0.0;
                continue;
            }
            let col = x_c.column(j);
            // rho_j is the correlation of feature j with the residual
            // excluding its own current contribution
            let rho = col.dot(&residual) + col_norms[j] * w[j];
            let w_new = soft_threshold(rho, lambda) / col_norms[j];
            let delta = w_new - w[j];
            if delta != 0.0 {
                residual.scaled_add(-delta, &col);
                max_delta = max_delta.max(delta.abs());
                w[j] = w_new;
            }
        }
        if max_delta < TOL {
            break;
        }
    }

    let intercept = y_mean - w.dot(&x_mean);
    Ok(LinearModel {
        coefficients: w,
        intercept,
    })
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}
