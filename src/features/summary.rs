//! Per-window summary statistics: a fixed-dim vector per window for the bundled backends.

use ndarray::{Array1, Array2, ArrayView2, ArrayView3, Axis};

/// mean, std, min, max, slope
pub const STATS_PER_CHANNEL: usize = 5;

/// Encode every window of shape (win_size, channels) to `channels * STATS_PER_CHANNEL` values.
pub fn summarize(windows: ArrayView3<'_, f64>) -> Array2<f64> {
    let n = windows.len_of(Axis(0));
    let dim = windows.len_of(Axis(2)) * STATS_PER_CHANNEL;
    let mut out = Array2::<f64>::zeros((n, dim));
    for (k, w) in windows.axis_iter(Axis(0)).enumerate() {
        out.row_mut(k).assign(&summarize_window(w));
    }
    out
}

pub fn summarize_window(window: ArrayView2<'_, f64>) -> Array1<f64> {
    let len = window.nrows();
    let mut out = Vec::with_capacity(window.ncols() * STATS_PER_CHANNEL);
    // Centered sample index, reused for the slope of every channel.
    let x_mean = (len as f64 - 1.0) / 2.0;
    let sxx: f64 = (0..len).map(|i| (i as f64 - x_mean).powi(2)).sum();

    for col in window.axis_iter(Axis(1)) {
        if len == 0 {
            out.extend([0.0; STATS_PER_CHANNEL]);
            continue;
        }
        let mean = col.sum() / len as f64;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / len as f64;
        let min = col.iter().copied().fold(f64::INFINITY, f64::min);
        let max = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let slope = if sxx > 0.0 {
            col.iter()
                .enumerate()
                .map(|(i, v)| (i as f64 - x_mean) * (v - mean))
                .sum::<f64>()
                / sxx
        } else {
            0.0
        };
        out.extend([mean, var.sqrt(), min, max, slope]);
    }
    Array1::from(out)
}
