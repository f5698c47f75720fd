//! Data model: per-deployment sensor series and event sets.
//! Everything is keyed by deployment id in a `BTreeMap`, so every batch
//! operation walks deployments in sorted key order.

mod synthetic;

pub use synthetic::{synthetic_deployments, SyntheticConfig};

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use ndarray::{Array2, ArrayView2};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Mapping deployment id → per-deployment value, iterated in key order.
pub type Deployments<T> = BTreeMap<String, T>;

/// True event timestamps of one deployment.
pub type EventSet = BTreeSet<DateTime<Utc>>;

/// Time-indexed multichannel recording of one deployment.
/// Rows of `values` are samples, columns are channels.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSeries {
    timestamps: Vec<DateTime<Utc>>,
    channels: Vec<String>,
    values: Array2<f64>,
}

impl SensorSeries {
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        channels: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self> {
        if values.nrows() != timestamps.len() {
            return Err(Error::InvalidSeries(format!(
                "{} timestamps but {} rows",
                timestamps.len(),
                values.nrows()
            )));
        }
        if values.ncols() != channels.len() {
            return Err(Error::InvalidSeries(format!(
                "{} channel names but {} columns",
                channels.len(),
                values.ncols()
            )));
        }
        if let Some(i) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(Error::InvalidSeries(format!(
                "timestamps not strictly increasing at {}",
                timestamps[i + 1]
            )));
        }
        Ok(Self {
            timestamps,
            channels,
            values,
        })
    }

    /// Uniformly sampled series starting at `start`.
    pub fn uniform(
        start: DateTime<Utc>,
        period: Duration,
        channels: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self> {
        if period <= Duration::zero() {
            return Err(Error::InvalidSeries("sampling period must be positive".into()));
        }
        let timestamps: Vec<DateTime<Utc>> =
            std::iter::successors(Some(start), |t| t.checked_add_signed(period))
                .take(values.nrows())
                .collect();
        if timestamps.len() < values.nrows() {
            return Err(Error::InvalidSeries(format!(
                "{} samples every {} from {} overflow the time range",
                values.nrows(),
                period,
                start
            )));
        }
        Self::new(timestamps, channels, values)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Row index of an exact sample time.
    pub fn index_of(&self, t: DateTime<Utc>) -> Option<usize> {
        self.timestamps.binary_search(&t).ok()
    }

    /// Median spacing between consecutive samples; zero for fewer than two samples.
    pub fn sampling_interval(&self) -> Duration {
        let mut diffs: Vec<Duration> = self
            .timestamps
            .windows(2)
            .map(|w| w[1] - w[0])
            .collect();
        if diffs.is_empty() {
            return Duration::zero();
        }
        diffs.sort();
        diffs[diffs.len() / 2]
    }
}

/// Channel names shared by every deployment, or `ChannelMismatch`.
pub fn common_channels(sensors: &Deployments<SensorSeries>) -> Result<Vec<String>> {
    let mut expected: Option<&[String]> = None;
    for (id, series) in sensors {
        match expected {
            None => expected = Some(series.channels()),
            Some(exp) if exp != series.channels() => {
                return Err(Error::ChannelMismatch {
                    deployment: id.clone(),
                    expected: exp.to_vec(),
                    found: series.channels().to_vec(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(expected.map(<[String]>::to_vec).unwrap_or_default())
}

/// Fails with `DeploymentMismatch` on the first key of `actual` absent from `expected`.
pub fn check_subset<A, B>(actual: &Deployments<A>, expected: &Deployments<B>) -> Result<()> {
    match actual.keys().find(|k| !expected.contains_key(*k)) {
        Some(k) => Err(Error::DeploymentMismatch {
            deployment: k.clone(),
        }),
        None => Ok(()),
    }
}

/// Seeded shuffle of deployment ids into (test, train).
pub fn split_deployments<R: Rng + ?Sized>(
    keys: impl IntoIterator<Item = String>,
    n_test: usize,
    rng: &mut R,
) -> (Vec<String>, Vec<String>) {
    let mut keys: Vec<String> = keys.into_iter().collect();
    keys.shuffle(rng);
    let n_test = n_test.min(keys.len());
    let train = keys.split_off(n_test);
    (keys, train)
}

/// Entries of `map` whose keys are listed in `keys`.
pub fn subset<T: Clone>(map: &Deployments<T>, keys: &[String]) -> Deployments<T> {
    keys.iter()
        .filter_map(|k| map.get(k).map(|v| (k.clone(), v.clone())))
        .collect()
}
