//! Local window classification.
//!
//! [`LocalClassifier`] is the one pluggable seam of the pipeline: `fit` turns
//! labeled windows into a [`LocalModel`], and the model scores windows with a
//! probability of containing an event. [`LogisticRegression`] and
//! [`GaussianNaiveBayes`] are the bundled backends; both classify the summary
//! vector of each window (see [`crate::features::summarize`]).

mod local;
mod logistic;
mod naive_bayes;

pub use local::{assign_folds, cross_validate, CrossValidation, LabeledWindows};
pub use logistic::{LogisticModel, LogisticRegression};
pub use naive_bayes::{GaussianNaiveBayes, NaiveBayesModel};

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

/// Trains a [`LocalModel`] from windows of shape (n, win_size, channels) and one label per window.
pub trait LocalClassifier: Send + Sync {
    type Model: LocalModel;

    fn fit(&self, windows: ArrayView3<'_, f64>, labels: &[bool]) -> Result<Self::Model>;
}

/// A trained local classifier.
pub trait LocalModel: Send + Sync {
    /// Probability of an event, one per window.
    fn predict_proba(&self, windows: ArrayView3<'_, f64>) -> Result<Array1<f64>>;
}

/// Local scores of one deployment, aligned on window anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSeries {
    pub timestamps: Vec<DateTime<Utc>>,
    /// Row index of each anchor within the deployment's sensor series
    pub positions: Vec<usize>,
    pub scores: Vec<f64>,
}

impl ScoreSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Per-feature z-scoring fitted on training rows. Zero-variance features pass through centered.
#[derive(Debug, Clone)]
pub(crate) struct Standardizer {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Standardizer {
    pub(crate) fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let mean = x.sum_axis(Axis(0)) / n;
        let var = x
            .axis_iter(Axis(0))
            .fold(Array1::<f64>::zeros(x.ncols()), |acc, row| {
                let d = &row - &mean;
                acc + &d * &d
            })
            / n;
        let scale = var.mapv(|v| if v > 1e-12 { v.sqrt() } else { 1.0 });
        Self { mean, scale }
    }

    pub(crate) fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.mean) / &self.scale
    }

    pub(crate) fn dim(&self) -> usize {
        self.mean.len()
    }
}

/// Shared input checks of the bundled backends.
pub(crate) fn check_training_set(windows: &ArrayView3<'_, f64>, labels: &[bool]) -> Result<()> {
    if windows.len_of(Axis(0)) != labels.len() {
        return Err(Error::Classifier(format!(
            "{} windows but {} labels",
            windows.len_of(Axis(0)),
            labels.len()
        )));
    }
    let positives = labels.iter().filter(|&&l| l).count();
    if positives == 0 || positives == labels.len() {
        return Err(Error::Classifier(
            "training set must contain both events and nonevents".into(),
        ));
    }
    Ok(())
}

pub(crate) fn check_dim(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::Classifier(format!(
            "model expects {} features, got {}",
            expected, got
        )));
    }
    Ok(())
}
