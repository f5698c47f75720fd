//! Pipeline configuration. Fixed for the lifetime of a `Stickleback` instance.

use crate::error::{Error, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Window length in samples
    pub win_size: usize,
    /// Matching tolerance between predicted and true events (milliseconds)
    pub tol_ms: i64,
    /// Stride of the dense window grid used by `predict`
    pub nth: usize,
    /// Cross-validation folds for the local stage
    pub n_folds: usize,
    /// Seed of the single random source threaded through sampling and fold assignment
    pub seed: u64,
    /// Nonevent sampling
    pub nonevent: NoneventConfig,
    /// Local-maximum selection
    pub global: GlobalConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoneventConfig {
    /// Nonevents drawn per true event
    pub ratio: f64,
    /// Exclusion radius around each event, in multiples of one window duration
    pub exclusion_windows: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Neighborhood radius in raw samples; `None` means `win_size`
    pub radius: Option<usize>,
    /// Scores must exceed this to count as an event
    pub floor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            win_size: 20,
            tol_ms: 5_000,
            nth: 20,
            n_folds: 2,
            seed: 1234,
            nonevent: NoneventConfig::default(),
            global: GlobalConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for NoneventConfig {
    fn default() -> Self {
        Self {
            ratio: 1.0,
            exclusion_windows: 1.0,
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            radius: None,
            floor: 0.0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl PipelineConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            if let Ok(c) = Self::from_json_file(path) {
                return c;
            }
            tracing::warn!(path = %path.display(), "unreadable config; using defaults");
        }
        Self::default()
    }

    /// Strict variant of [`PipelineConfig::load`]: any IO or parse failure is an error.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn tol(&self) -> Duration {
        Duration::milliseconds(self.tol_ms)
    }

    /// Neighborhood radius of the global stage in raw samples.
    pub fn radius(&self) -> usize {
        self.global.radius.unwrap_or(self.win_size)
    }

    pub fn validate(&self) -> Result<()> {
        if self.win_size == 0 {
            return Err(Error::InvalidConfig("win_size must be at least 1".into()));
        }
        if self.nth == 0 {
            return Err(Error::InvalidConfig("nth must be at least 1".into()));
        }
        if self.n_folds < 2 {
            return Err(Error::InvalidConfig(format!(
                "n_folds must be at least 2, got {}",
                self.n_folds
            )));
        }
        if self.tol_ms < 0 {
            return Err(Error::InvalidConfig("tol_ms must not be negative".into()));
        }
        if !(self.nonevent.ratio.is_finite() && self.nonevent.ratio > 0.0) {
            return Err(Error::InvalidConfig("nonevent.ratio must be positive".into()));
        }
        if !(self.nonevent.exclusion_windows.is_finite() && self.nonevent.exclusion_windows >= 0.0) {
            return Err(Error::InvalidConfig(
                "nonevent.exclusion_windows must not be negative".into(),
            ));
        }
        if self.global.floor.is_nan() {
            return Err(Error::InvalidConfig("global.floor is NaN".into()));
        }
        Ok(())
    }
}
