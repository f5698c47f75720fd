//! Gaussian naive Bayes on window summaries.

use super::{check_dim, check_training_set, LocalClassifier, LocalModel};
use crate::error::Result;
use crate::features::summarize;
use ndarray::{Array1, Array2, ArrayView1, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Fraction of the largest feature variance added to every variance
    pub var_smoothing: f64,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self {
            var_smoothing: 1e-9,
        }
    }
}

#[derive(Debug, Clone)]
struct ClassStats {
    log_prior: f64,
    mean: Array1<f64>,
    var: Array1<f64>,
}

impl ClassStats {
    fn log_likelihood(&self, x: ArrayView1<'_, f64>) -> f64 {
        let mut ll = self.log_prior;
        for ((v, m), s2) in x.iter().zip(&self.mean).zip(&self.var) {
            ll -= 0.5 * ((2.0 * std::f64::consts::PI * s2).ln() + (v - m).powi(2) / s2);
        }
        ll
    }
}

#[derive(Debug, Clone)]
pub struct NaiveBayesModel {
    negative: ClassStats,
    positive: ClassStats,
}

fn class_stats(x: &Array2<f64>, rows: &[usize], n_total: usize, epsilon: f64) -> ClassStats {
    let sub = x.select(Axis(0), rows);
    let n = sub.nrows() as f64;
    let mean = sub.sum_axis(Axis(0)) / n;
    let var = sub.var_axis(Axis(0), 0.0) + epsilon;
    ClassStats {
        log_prior: (n / n_total as f64).ln(),
        mean,
        var,
    }
}

impl LocalClassifier for GaussianNaiveBayes {
    type Model = NaiveBayesModel;

    fn fit(&self, windows: ArrayView3<'_, f64>, labels: &[bool]) -> Result<NaiveBayesModel> {
        check_training_set(&windows, labels)?;
        let x = summarize(windows);
        let max_var = x
            .var_axis(Axis(0), 0.0)
            .iter()
            .copied()
            .fold(0.0_f64, f64::max);
        // Keeps constant features from producing zero variances.
        let epsilon = (self.var_smoothing * max_var).max(1e-12);

        let (pos, neg): (Vec<usize>, Vec<usize>) = (0..labels.len()).partition(|&i| labels[i]);
        Ok(NaiveBayesModel {
            negative: class_stats(&x, &neg, labels.len(), epsilon),
            positive: class_stats(&x, &pos, labels.len(), epsilon),
        })
    }
}

impl LocalModel for NaiveBayesModel {
    fn predict_proba(&self, windows: ArrayView3<'_, f64>) -> Result<Array1<f64>> {
        let x = summarize(windows);
        check_dim(self.positive.mean.len(), x.ncols())?;
        Ok(x
            .axis_iter(Axis(0))
            .map(|row| {
                let diff = self.negative.log_likelihood(row) - self.positive.log_likelihood(row);
                1.0 / (1.0 + diff.exp())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn separates_by_level() {
        let n = 30;
        let mut w = Array3::<f64>::zeros((n, 4, 2));
        let mut labels = Vec::new();
        for k in 0..n {
            let pos = k % 3 == 0;
            let level = if pos { 5.0 } else { 0.0 };
            for i in 0..4 {
                w[[k, i, 0]] = level + 0.01 * ((k + i) % 5) as f64;
                w[[k, i, 1]] = 0.02 * (k % 4) as f64;
            }
            labels.push(pos);
        }
        let model = GaussianNaiveBayes::default().fit(w.view(), &labels).unwrap();
        let p = model.predict_proba(w.view()).unwrap();
        assert_eq!(p.len(), n);
        for (score, label) in p.iter().zip(&labels) {
            assert_eq!(*score > 0.5, *label);
            assert!((0.0..=1.0).contains(score));
        }
    }
}
