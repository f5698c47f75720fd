//! Seeded synthetic sample data: lunge-like deployments with known event times.

use super::{Deployments, EventSet, SensorSeries};
use crate::error::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub deployments: usize,
    /// Samples per deployment
    pub samples: usize,
    pub events_per_deployment: usize,
    /// Sampling period (milliseconds)
    pub period_ms: i64,
    /// Half-width of the injected event signature, in samples
    pub signature_half_width: usize,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            deployments: 4,
            samples: 6_000,
            events_per_deployment: 12,
            period_ms: 100,
            signature_half_width: 10,
            seed: 42,
        }
    }
}

pub const CHANNELS: [&str; 3] = ["depth", "pitch", "jerk"];

/// Sensors and events for `config.deployments` deployments named `sim-00`, `sim-01`, ...
///
/// Events are placed one per equal-length segment, away from segment edges, so
/// consecutive events are separated by at least half a segment.
pub fn synthetic_deployments(
    config: &SyntheticConfig,
) -> Result<(Deployments<SensorSeries>, Deployments<EventSet>)> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut sensors = Deployments::new();
    let mut events = Deployments::new();
    let base = Utc
        .with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);

    for d in 0..config.deployments {
        let id = format!("sim-{:02}", d);
        let start: DateTime<Utc> = base + Duration::days(d as i64);
        let period = Duration::milliseconds(config.period_ms);
        let event_idx = place_events(config, &mut rng);
        let values = render(config, &event_idx, &mut rng);
        let series = SensorSeries::uniform(
            start,
            period,
            CHANNELS.iter().map(|c| c.to_string()).collect(),
            values,
        )?;
        let set: EventSet = event_idx
            .iter()
            .map(|&i| series.timestamps()[i])
            .collect();
        tracing::debug!(deployment = %id, events = set.len(), samples = series.len(), "synthesized deployment");
        sensors.insert(id.clone(), series);
        events.insert(id, set);
    }
    Ok((sensors, events))
}

fn place_events(config: &SyntheticConfig, rng: &mut StdRng) -> Vec<usize> {
    let k = config.events_per_deployment;
    if k == 0 || config.samples == 0 {
        return Vec::new();
    }
    let segment = config.samples / k;
    let margin = segment / 4;
    (0..k)
        .filter_map(|j| {
            let lo = j * segment + margin;
            let hi = (j + 1) * segment - margin;
            (lo < hi).then(|| rng.gen_range(lo..hi))
        })
        .collect()
}

fn render(config: &SyntheticConfig, event_idx: &[usize], rng: &mut StdRng) -> Array2<f64> {
    let n = config.samples;
    let hw = config.signature_half_width.max(1) as f64;
    let mut values = Array2::<f64>::zeros((n, CHANNELS.len()));

    // Dive profile: slow oscillation with per-deployment phase.
    let phase = rng.gen_range(0.0..2.0 * PI);
    for i in 0..n {
        let t = i as f64 / n as f64;
        values[[i, 0]] = 50.0 + 40.0 * (2.0 * PI * 8.0 * t + phase).sin() + rng.gen_range(-0.5..0.5);
        values[[i, 1]] = rng.gen_range(-0.05..0.05);
        values[[i, 2]] = rng.gen_range(0.0..0.1);
    }

    // Lunge signature: pitch ramp and jerk burst peaking at the event.
    for &e in event_idx {
        let lo = e.saturating_sub(2 * hw as usize);
        let hi = (e + 2 * hw as usize).min(n.saturating_sub(1));
        for i in lo..=hi {
            let dx = (i as f64 - e as f64) / hw;
            let bump = (-0.5 * dx * dx).exp();
            values[[i, 1]] += 0.8 * bump;
            values[[i, 2]] += 2.5 * bump;
        }
    }
    values
}
