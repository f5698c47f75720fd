//! Logistic regression on standardized window summaries, fitted by full-batch gradient descent.

use super::{check_dim, check_training_set, LocalClassifier, LocalModel, Standardizer};
use crate::error::Result;
use crate::features::summarize;
use ndarray::{Array1, ArrayView3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub learning_rate: f64,
    pub epochs: usize,
    /// L2 penalty on weights (not bias)
    pub l2: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            epochs: 500,
            l2: 1e-3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogisticModel {
    scaler: Standardizer,
    weights: Array1<f64>,
    bias: f64,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LocalClassifier for LogisticRegression {
    type Model = LogisticModel;

    fn fit(&self, windows: ArrayView3<'_, f64>, labels: &[bool]) -> Result<LogisticModel> {
        check_training_set(&windows, labels)?;
        let raw = summarize(windows);
        let scaler = Standardizer::fit(&raw);
        let x = scaler.transform(&raw);
        let y: Array1<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
        let n = x.nrows() as f64;

        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;
        for _ in 0..self.epochs {
            let p = (x.dot(&weights) + bias).mapv(sigmoid);
            let err = &p - &y;
            let grad_w = x.t().dot(&err) / n + &weights * self.l2;
            let grad_b = err.sum() / n;
            weights.scaled_add(-self.learning_rate, &grad_w);
            bias -= self.learning_rate * grad_b;
        }
        tracing::debug!(rows = x.nrows(), features = x.ncols(), bias, "fitted logistic model");
        Ok(LogisticModel {
            scaler,
            weights,
            bias,
        })
    }
}

impl LocalModel for LogisticModel {
    fn predict_proba(&self, windows: ArrayView3<'_, f64>) -> Result<Array1<f64>> {
        let raw = summarize(windows);
        check_dim(self.scaler.dim(), raw.ncols())?;
        let x = self.scaler.transform(&raw);
        Ok((x.dot(&self.weights) + self.bias).mapv(sigmoid))
    }
}
