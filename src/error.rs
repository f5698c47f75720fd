//! Error taxonomy shared by every pipeline stage.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Series is shorter than one window.
    #[error("deployment {deployment}: series has {len} samples, fewer than win_size {win_size}")]
    InsufficientData {
        deployment: String,
        len: usize,
        win_size: usize,
    },

    /// Requested anchor has no full preceding window (or is not a sample time).
    #[error("deployment {deployment}: anchor {anchor} has no full window of {win_size} samples")]
    OutOfRange {
        deployment: String,
        anchor: DateTime<Utc>,
        win_size: usize,
    },

    #[error("deployment {deployment}: requested {requested} nonevents but only {available} anchors clear every event")]
    InsufficientNonOverlap {
        deployment: String,
        requested: usize,
        available: usize,
    },

    #[error("deployment {deployment}: event set is empty")]
    EmptyEventSet { deployment: String },

    #[error("deployment {deployment} is not in the expected set")]
    DeploymentMismatch { deployment: String },

    #[error("invalid sensor series: {0}")]
    InvalidSeries(String),

    #[error("deployment {deployment}: channels {found:?} do not match {expected:?}")]
    ChannelMismatch {
        deployment: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("pipeline has not been fitted")]
    NotFitted,

    #[error("classifier failed: {0}")]
    Classifier(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
