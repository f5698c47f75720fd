//! Window extraction, nonevent sampling, and per-window summary features.

mod nonevents;
mod summary;
mod window;

pub use nonevents::{exclusion_tolerance, sample_nonevents};
pub use summary::{summarize, summarize_window, STATS_PER_CHANNEL};
pub use window::{extract_at, extract_dense, windows_at, windows_dense};

use chrono::{DateTime, Utc};
use ndarray::{Array3, ArrayView2, ArrayView3, Axis};

/// Fixed-length windows of one deployment, indexed by anchor timestamp.
/// `windows` has shape (anchors, win_size, channels); row `k` ends at `anchors[k]`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowTable {
    anchors: Vec<DateTime<Utc>>,
    positions: Vec<usize>,
    windows: Array3<f64>,
}

impl WindowTable {
    pub(crate) fn new(anchors: Vec<DateTime<Utc>>, positions: Vec<usize>, windows: Array3<f64>) -> Self {
        debug_assert_eq!(anchors.len(), windows.len_of(Axis(0)));
        debug_assert_eq!(anchors.len(), positions.len());
        Self {
            anchors,
            positions,
            windows,
        }
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn win_size(&self) -> usize {
        self.windows.len_of(Axis(1))
    }

    pub fn anchors(&self) -> &[DateTime<Utc>] {
        &self.anchors
    }

    /// Row index of each anchor within its sensor series.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn windows(&self) -> ArrayView3<'_, f64> {
        self.windows.view()
    }

    /// Window `k`, shape (win_size, channels).
    pub fn window(&self, k: usize) -> ArrayView2<'_, f64> {
        self.windows.index_axis(Axis(0), k)
    }
}
