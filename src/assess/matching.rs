//! One-to-one matching of predicted to true events, closest pairs first.

use crate::data::{Deployments, EventSet};
use crate::error::{Error, Result};
use crate::global::GlobalPrediction;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Prediction matched to a true event
    #[serde(rename = "TP")]
    TruePositive,
    /// Prediction with no true event in tolerance
    #[serde(rename = "FP")]
    FalsePositive,
    /// True event with no prediction in tolerance
    #[serde(rename = "FN")]
    FalseNegative,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::TruePositive => "TP",
            Outcome::FalsePositive => "FP",
            Outcome::FalseNegative => "FN",
        }
    }
}

/// Outcomes of one deployment keyed by timestamp: predicted times carry TP/FP,
/// unmatched true event times carry FN.
pub type OutcomeSeries = BTreeMap<DateTime<Utc>, Outcome>;

/// Outcomes for every deployment. `predictions` and `events` must cover the same deployments.
pub fn assess(
    predictions: &Deployments<GlobalPrediction>,
    events: &Deployments<EventSet>,
    tol: Duration,
) -> Result<Deployments<OutcomeSeries>> {
    if tol < Duration::zero() {
        return Err(Error::InvalidConfig("tolerance must not be negative".into()));
    }
    crate::data::check_subset(predictions, events)?;
    crate::data::check_subset(events, predictions)?;
    if let Some((id, _)) = events.iter().find(|(_, e)| e.is_empty()) {
        return Err(Error::EmptyEventSet {
            deployment: id.clone(),
        });
    }

    let mut out = Deployments::new();
    for (id, prediction) in predictions {
        let outcomes = match_events(&prediction.events(), &events[id], tol);
        tracing::debug!(
            deployment = %id,
            predicted = prediction.events().len(),
            actual = events[id].len(),
            "assessed deployment"
        );
        out.insert(id.clone(), outcomes);
    }
    Ok(out)
}

/// Greedy matching over candidate pairs sorted by |Δt| (ties: earlier prediction,
/// then earlier true event). Each true event and each prediction is used at most once.
pub fn match_events(predicted: &[DateTime<Utc>], truth: &EventSet, tol: Duration) -> OutcomeSeries {
    let tol = tol.max(Duration::zero());
    let predicted: BTreeSet<DateTime<Utc>> = predicted.iter().copied().collect();

    let mut pairs: Vec<(Duration, DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    for &p in &predicted {
        let lo = p.checked_sub_signed(tol).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let hi = p.checked_add_signed(tol).unwrap_or(DateTime::<Utc>::MAX_UTC);
        for &t in truth.range(lo..=hi) {
            pairs.push(((p - t).abs(), p, t));
        }
    }
    pairs.sort();

    let mut matched_pred = BTreeSet::new();
    let mut matched_true = BTreeSet::new();
    for (_, p, t) in pairs {
        if matched_pred.contains(&p) || matched_true.contains(&t) {
            continue;
        }
        matched_pred.insert(p);
        matched_true.insert(t);
    }

    let mut out = OutcomeSeries::new();
    for p in predicted {
        let o = if matched_pred.contains(&p) {
            Outcome::TruePositive
        } else {
            Outcome::FalsePositive
        };
        out.insert(p, o);
    }
    for &t in truth {
        if !matched_true.contains(&t) {
            out.insert(t, Outcome::FalseNegative);
        }
    }
    out
}
