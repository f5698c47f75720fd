//! Nonevent sampling: random anchors whose windows stay clear of every true event.
//!
//! One random source is consumed across deployments in key order, so a fixed
//! seed reproduces the whole sampled set regardless of how many deployments
//! are involved.

use crate::config::NoneventConfig;
use crate::data::{Deployments, EventSet, SensorSeries};
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Minimum anchor-to-event distance for a sampled nonevent (exclusive).
pub fn exclusion_tolerance(series: &SensorSeries, win_size: usize, config: &NoneventConfig) -> Duration {
    let interval_us = series
        .sampling_interval()
        .num_microseconds()
        .unwrap_or(i64::MAX) as f64;
    let us = interval_us * win_size as f64 * config.exclusion_windows;
    Duration::microseconds(us.round().min(i64::MAX as f64) as i64)
}

/// For every deployment in `events`, `ceil(ratio * events)` distinct anchors,
/// sorted by time, each farther than the exclusion tolerance from every event
/// and at least `win_size` samples away from every event anchor, so no sampled
/// window shares a sample with an event window.
pub fn sample_nonevents<R: Rng + ?Sized>(
    sensors: &Deployments<SensorSeries>,
    events: &Deployments<EventSet>,
    win_size: usize,
    config: &NoneventConfig,
    rng: &mut R,
) -> Result<Deployments<Vec<DateTime<Utc>>>> {
    let mut out = Deployments::new();
    for (id, evs) in events {
        let series = sensors.get(id).ok_or_else(|| Error::DeploymentMismatch {
            deployment: id.clone(),
        })?;
        let anchors = sample_one(id, series, evs, win_size, config, rng)?;
        out.insert(id.clone(), anchors);
    }
    Ok(out)
}

fn sample_one<R: Rng + ?Sized>(
    deployment: &str,
    series: &SensorSeries,
    events: &EventSet,
    win_size: usize,
    config: &NoneventConfig,
    rng: &mut R,
) -> Result<Vec<DateTime<Utc>>> {
    let requested = (events.len() as f64 * config.ratio).ceil() as usize;
    let excl = exclusion_tolerance(series, win_size, config);
    let sorted: Vec<DateTime<Utc>> = events.iter().copied().collect();
    let event_rows: Vec<usize> = sorted
        .iter()
        .map(|e| series.timestamps().partition_point(|t| t < e))
        .collect();

    let start = win_size.saturating_sub(1);
    let pool: Vec<usize> = (start..series.len())
        .filter(|&i| clear_of_events(series.timestamps()[i], &sorted, excl))
        .filter(|&i| clear_of_event_windows(i, &event_rows, win_size))
        .collect();

    if pool.len() < requested {
        return Err(Error::InsufficientNonOverlap {
            deployment: deployment.to_string(),
            requested,
            available: pool.len(),
        });
    }

    let mut picked: Vec<usize> = rand::seq::index::sample(rng, pool.len(), requested)
        .into_iter()
        .map(|k| pool[k])
        .collect();
    picked.sort_unstable();

    tracing::debug!(
        deployment,
        requested,
        available = pool.len(),
        exclusion_ms = excl.num_milliseconds(),
        "sampled nonevents"
    );
    Ok(picked.into_iter().map(|i| series.timestamps()[i]).collect())
}

/// True when the nearest event on either side of `t` is farther than `excl`.
fn clear_of_events(t: DateTime<Utc>, sorted_events: &[DateTime<Utc>], excl: Duration) -> bool {
    let k = sorted_events.partition_point(|e| *e < t);
    let after_ok = sorted_events.get(k).map_or(true, |e| *e - t > excl);
    let before_ok = k == 0 || t - sorted_events[k - 1] > excl;
    after_ok && before_ok
}

/// True when the window anchored at row `i` shares no row with any event window.
fn clear_of_event_windows(i: usize, event_rows: &[usize], win_size: usize) -> bool {
    let k = event_rows.partition_point(|&r| r < i);
    let after_ok = event_rows.get(k).map_or(true, |&r| r - i >= win_size);
    let before_ok = k == 0 || i - event_rows[k - 1] >= win_size;
    after_ok && before_ok
}
