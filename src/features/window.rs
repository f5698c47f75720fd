//! Window extraction: sensor series → trailing windows anchored at their last sample.

use super::WindowTable;
use crate::data::{check_subset, Deployments, SensorSeries};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use ndarray::{s, Array3};

/// Every `nth` window of every deployment, starting at the first full window.
pub fn extract_dense(
    sensors: &Deployments<SensorSeries>,
    win_size: usize,
    nth: usize,
) -> Result<Deployments<WindowTable>> {
    sensors
        .iter()
        .map(|(id, series)| Ok((id.clone(), windows_dense(id, series, win_size, nth)?)))
        .collect()
}

/// Windows ending at the caller's anchors, per deployment, in the caller's order.
pub fn extract_at<A>(
    sensors: &Deployments<SensorSeries>,
    anchors: &Deployments<A>,
    win_size: usize,
) -> Result<Deployments<WindowTable>>
where
    for<'a> &'a A: IntoIterator<Item = &'a DateTime<Utc>>,
{
    check_subset(anchors, sensors)?;
    anchors
        .iter()
        .map(|(id, at)| {
            let at: Vec<DateTime<Utc>> = at.into_iter().copied().collect();
            Ok((id.clone(), windows_at(id, &sensors[id], &at, win_size)?))
        })
        .collect()
}

pub fn windows_dense(
    deployment: &str,
    series: &SensorSeries,
    win_size: usize,
    nth: usize,
) -> Result<WindowTable> {
    if win_size == 0 || nth == 0 {
        return Err(Error::InvalidConfig("win_size and nth must be at least 1".into()));
    }
    if series.len() < win_size {
        return Err(Error::InsufficientData {
            deployment: deployment.to_string(),
            len: series.len(),
            win_size,
        });
    }
    let positions: Vec<usize> = (win_size - 1..series.len()).step_by(nth).collect();
    let table = gather(series, positions, win_size);
    tracing::debug!(deployment, windows = table.len(), win_size, nth, "dense windows");
    Ok(table)
}

pub fn windows_at(
    deployment: &str,
    series: &SensorSeries,
    anchors: &[DateTime<Utc>],
    win_size: usize,
) -> Result<WindowTable> {
    if win_size == 0 {
        return Err(Error::InvalidConfig("win_size must be at least 1".into()));
    }
    let positions = anchors
        .iter()
        .map(|&t| match series.index_of(t) {
            Some(i) if i + 1 >= win_size => Ok(i),
            _ => Err(Error::OutOfRange {
                deployment: deployment.to_string(),
                anchor: t,
                win_size,
            }),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(gather(series, positions, win_size))
}

fn gather(series: &SensorSeries, positions: Vec<usize>, win_size: usize) -> WindowTable {
    let values = series.values();
    let mut windows = Array3::<f64>::zeros((positions.len(), win_size, values.ncols()));
    for (k, &end) in positions.iter().enumerate() {
        windows
            .slice_mut(s![k, .., ..])
            .assign(&values.slice(s![end + 1 - win_size..=end, ..]));
    }
    let anchors = positions.iter().map(|&i| series.timestamps()[i]).collect();
    WindowTable::new(anchors, positions, windows)
}
