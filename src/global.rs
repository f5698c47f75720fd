//! Global stage: dense local scores → discrete events by local-maximum selection.
//!
//! An anchor is an event when its score exceeds the floor and beats every other
//! score whose anchor lies within `radius` raw samples. Equal scores go to the
//! earliest anchor. Two surviving events are therefore always more than
//! `radius` samples apart, which makes the selection idempotent.

use crate::model::ScoreSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalStage {
    pub radius: usize,
    pub floor: f64,
}

/// Local scores of one deployment plus the event flag of every anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalPrediction {
    pub local: ScoreSeries,
    pub is_event: Vec<bool>,
}

impl GlobalPrediction {
    /// Anchors flagged as events, in time order.
    pub fn events(&self) -> Vec<DateTime<Utc>> {
        self.local
            .timestamps
            .iter()
            .zip(&self.is_event)
            .filter_map(|(t, &e)| e.then_some(*t))
            .collect()
    }
}

impl GlobalStage {
    pub fn new(radius: usize, floor: f64) -> Self {
        Self { radius, floor }
    }

    pub fn predict(&self, local: ScoreSeries) -> GlobalPrediction {
        let is_event = self.local_maxima(&local.positions, &local.scores);
        GlobalPrediction { local, is_event }
    }

    /// Event flag per anchor. `positions` must be strictly increasing.
    pub fn local_maxima(&self, positions: &[usize], scores: &[f64]) -> Vec<bool> {
        debug_assert_eq!(positions.len(), scores.len());
        let n = scores.len();
        let mut out = vec![false; n];
        // Sliding neighborhood [lo, hi) over anchors within `radius` samples.
        let mut lo = 0;
        let mut hi = 0;
        for i in 0..n {
            while positions[i] - positions[lo] > self.radius {
                lo += 1;
            }
            while hi < n && positions[hi] - positions[i] <= self.radius {
                hi += 1;
            }
            let s = scores[i];
            if !(s > self.floor) {
                continue;
            }
            let earlier_ok = scores[lo..i].iter().all(|&o| !(o >= s));
            let later_ok = scores[i + 1..hi].iter().all(|&o| !(o > s));
            out[i] = earlier_ok && later_ok;
        }
        out
    }

    /// Scores with every non-event replaced by `-inf`.
    pub fn suppress(&self, positions: &[usize], scores: &[f64]) -> Vec<f64> {
        self.local_maxima(positions, scores)
            .into_iter()
            .zip(scores)
            .map(|(e, &s)| if e { s } else { f64::NEG_INFINITY })
            .collect()
    }
}
