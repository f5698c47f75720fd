//! Cross-validated local stage: out-of-fold scores on the training windows, then a final refit.

use super::{LocalClassifier, LocalModel, ScoreSeries};
use crate::data::Deployments;
use crate::error::{Error, Result};
use crate::features::WindowTable;
use chrono::{DateTime, Utc};
use ndarray::{concatenate, Array3, ArrayView3, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Event windows (label `true`) and nonevent windows (label `false`) pooled
/// across deployments. Rows keep their (deployment, anchor, position) key.
#[derive(Debug, Clone)]
pub struct LabeledWindows {
    keys: Vec<(String, DateTime<Utc>, usize)>,
    windows: Array3<f64>,
    labels: Vec<bool>,
}

impl LabeledWindows {
    /// Pools deployments in key order, events before nonevents within each.
    pub fn build(
        events: &Deployments<WindowTable>,
        nonevents: &Deployments<WindowTable>,
    ) -> Result<Self> {
        let mut keys = Vec::new();
        let mut labels = Vec::new();
        let mut views: Vec<ArrayView3<'_, f64>> = Vec::new();

        let ids: BTreeSet<&String> = events.keys().chain(nonevents.keys()).collect();
        for id in ids {
            for (table, label) in [(events.get(id), true), (nonevents.get(id), false)] {
                let Some(table) = table else { continue };
                for (t, p) in table.anchors().iter().zip(table.positions()) {
                    keys.push((id.clone(), *t, *p));
                    labels.push(label);
                }
                views.push(table.windows());
            }
        }
        if views.is_empty() {
            return Err(Error::InvalidConfig("no labeled windows to train on".into()));
        }
        let windows = concatenate(Axis(0), &views)
            .map_err(|e| Error::Classifier(format!("windows do not stack: {}", e)))?;
        Ok(Self {
            keys,
            windows,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    pub fn windows(&self) -> ArrayView3<'_, f64> {
        self.windows.view()
    }

    fn rows(&self, idx: &[usize]) -> (Array3<f64>, Vec<bool>) {
        (
            self.windows.select(Axis(0), idx),
            idx.iter().map(|&i| self.labels[i]).collect(),
        )
    }
}

/// Fold of every row, stratified by label: event rows then nonevent rows are
/// shuffled and dealt round-robin with one running counter, so fold sizes and
/// per-class counts differ by at most one across folds.
pub fn assign_folds<R: Rng + ?Sized>(labels: &[bool], n_folds: usize, rng: &mut R) -> Vec<usize> {
    let mut folds = vec![0; labels.len()];
    let mut k = 0;
    for class in [true, false] {
        let mut rows: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        rows.shuffle(rng);
        for row in rows {
            folds[row] = k % n_folds;
            k += 1;
        }
    }
    folds
}

/// Output of [`cross_validate`].
pub struct CrossValidation<M> {
    /// Model refitted on every labeled window
    pub model: M,
    /// Held-out score of every labeled window, per deployment, ordered by anchor
    pub out_of_fold: Deployments<ScoreSeries>,
}

pub fn cross_validate<C, R>(
    classifier: &C,
    data: &LabeledWindows,
    n_folds: usize,
    rng: &mut R,
) -> Result<CrossValidation<C::Model>>
where
    C: LocalClassifier,
    R: Rng + ?Sized,
{
    if n_folds < 2 {
        return Err(Error::InvalidConfig("n_folds must be at least 2".into()));
    }
    if data.len() < n_folds {
        return Err(Error::InvalidConfig(format!(
            "{} labeled windows cannot fill {} folds",
            data.len(),
            n_folds
        )));
    }

    // Fold assignment is fixed before any training.
    let folds = assign_folds(data.labels(), n_folds, rng);
    let mut oof = vec![f64::NAN; data.len()];

    for fold in 0..n_folds {
        let (held, train): (Vec<usize>, Vec<usize>) = (0..data.len()).partition(|&i| folds[i] == fold);
        let (train_w, train_y) = data.rows(&train);
        let (held_w, _) = data.rows(&held);
        let positives = train_y.iter().filter(|&&y| y).count();
        if positives == 0 || positives == train_y.len() {
            tracing::warn!(fold, rows = train_y.len(), "training fold holds a single class");
        }
        let model = classifier.fit(train_w.view(), &train_y)?;
        let scores = model.predict_proba(held_w.view())?;
        if scores.len() != held.len() {
            return Err(Error::Classifier(format!(
                "model returned {} scores for {} windows",
                scores.len(),
                held.len()
            )));
        }
        for (&row, &s) in held.iter().zip(scores.iter()) {
            oof[row] = s;
        }
        tracing::debug!(fold, train = train.len(), held_out = held.len(), "cross-validation fold");
    }

    let model = classifier.fit(data.windows(), data.labels())?;
    Ok(CrossValidation {
        model,
        out_of_fold: group_scores(&data.keys, &oof),
    })
}

fn group_scores(keys: &[(String, DateTime<Utc>, usize)], scores: &[f64]) -> Deployments<ScoreSeries> {
    let mut grouped: BTreeMap<&str, BTreeMap<DateTime<Utc>, (usize, f64)>> = BTreeMap::new();
    for ((id, t, p), s) in keys.iter().zip(scores) {
        grouped.entry(id.as_str()).or_default().insert(*t, (*p, *s));
    }
    grouped
        .into_iter()
        .map(|(id, rows)| {
            let mut series = ScoreSeries {
                timestamps: Vec::with_capacity(rows.len()),
                positions: Vec::with_capacity(rows.len()),
                scores: Vec::with_capacity(rows.len()),
            };
            for (t, (p, s)) in rows {
                series.timestamps.push(t);
                series.positions.push(p);
                series.scores.push(s);
            }
            (id.to_string(), series)
        })
        .collect()
}
