//! Logistic regression for binary outcomes

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Fitted logistic model parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Array1<f64>,
    pub bias: f64,
}

fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
    z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

impl LogisticModel {
    /// Class-1 probability per record
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array1<f64> {
        sigmoid(&(x.dot(&self.weights) + self.bias))
    }

    /// Hard labels at the 0.5 threshold
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        self.predict_proba(x)
            .mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 })
    }
}

/// Fit via batch gradient descent with an L2 penalty
///
/// Stops when the gradient norm drops below tolerance or after `max_iter`
/// passes. Labels are expected as 0/1.
pub fn fit_logistic(
    x: &Array2<f64>,
    y: &Array1<f64>,
    alpha: f64,
    max_iter: usize,
    learning_rate: f64,
) -> Result<LogisticModel> {
    const TOL: f64 = 1e-6;

    let n_samples = x.nrows() as f64;
    let n_features = x.ncols();

    let mut weights = Array1::<f64>::zeros(n_features);
    let mut bias = 0.0;

    for _ in 0..max_iter {
        let probabilities = sigmoid(&(x.dot(&weights) + bias));
        let errors = &probabilities - y;

        let grad_w = x.t().dot(&errors) / n_samples + alpha * &weights;
        let grad_b = errors.mean().unwrap_or(0.0);

        let grad_norm = (grad_w.mapv(|v| v * v).sum() + grad_b * grad_b).sqrt();
        if grad_norm < TOL {
            break;
        }

        weights.scaled_add(-learning_rate, &grad_w);
        bias -= learning_rate * grad_b;
    }

    Ok(LogisticModel { weights, bias })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_separable_data() {
        let x = array![
            [0.0],
            [0.5],
            [1.0],
            [1.5],
            [4.0],
            [4.5],
            [5.0],
            [5.5]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];

        let model = fit_logistic(&x, &y, 0.0, 2000, 0.5).unwrap();
        let preds = model.predict(&x);
        for (p, t) in preds.iter().zip(y.iter()) {
            assert_eq!(p, t);
        }
    }

    #[test]
    fn test_probabilities_ordered() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let model = fit_logistic(&x, &y, 0.01, 1000, 0.3).unwrap();
        let proba = model.predict_proba(&x);
        assert!(proba[0] < proba[5], "probability should rise with x");
        for &p in proba.iter() {
            assert!((0.0..=1.0).contains(&p));
        }
    }
}
