//! Outcome counts per deployment and detection metrics.

use super::{Outcome, OutcomeSeries};
use crate::data::Deployments;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    #[serde(rename = "TP")]
    pub true_positives: usize,
    #[serde(rename = "FP")]
    pub false_positives: usize,
    #[serde(rename = "FN")]
    pub false_negatives: usize,
}

impl OutcomeCounts {
    pub fn from_series(series: &OutcomeSeries) -> Self {
        let mut c = Self::default();
        for o in series.values() {
            c.add(*o);
        }
        c
    }

    pub fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::TruePositive => self.true_positives += 1,
            Outcome::FalsePositive => self.false_positives += 1,
            Outcome::FalseNegative => self.false_negatives += 1,
        }
    }

    /// TP / (TP + FP); 0 when nothing was predicted.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN); 0 when there were no true events.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRow {
    pub deployment: String,
    #[serde(flatten)]
    pub counts: OutcomeCounts,
}

/// Outcome counts per deployment in key order, plus totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTable {
    pub rows: Vec<OutcomeRow>,
    pub total: OutcomeCounts,
}

impl OutcomeTable {
    pub fn from_outcomes(outcomes: &Deployments<OutcomeSeries>) -> Self {
        let mut total = OutcomeCounts::default();
        let rows = outcomes
            .iter()
            .map(|(id, series)| {
                let counts = OutcomeCounts::from_series(series);
                total.true_positives += counts.true_positives;
                total.false_positives += counts.false_positives;
                total.false_negatives += counts.false_negatives;
                OutcomeRow {
                    deployment: id.clone(),
                    counts,
                }
            })
            .collect();
        Self { rows, total }
    }
}
