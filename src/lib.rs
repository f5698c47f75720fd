//! Stickleback: detect point behaviors in longitudinal sensor data.
//!
//! Modular structure:
//! - [`data`]: Per-deployment sensor series and event sets, synthetic sample data
//! - [`features`]: Window extraction, nonevent sampling, window summaries
//! - [`model`]: Pluggable local classifier and its cross-validated training
//! - [`global`]: Local-maximum selection of discrete events
//! - [`assess`]: Outcome matching (TP / FP / FN) and outcome tables
//! - [`pipeline`]: `Stickleback` fit / predict / assess
//! - [`logging`]: Structured JSON logging

pub mod assess;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod global;
pub mod logging;
pub mod model;
pub mod pipeline;

pub use assess::{Outcome, OutcomeSeries, OutcomeTable};
pub use config::PipelineConfig;
pub use data::{Deployments, EventSet, SensorSeries};
pub use error::{Error, Result};
pub use features::WindowTable;
pub use global::{GlobalPrediction, GlobalStage};
pub use logging::StructuredLogger;
pub use model::{GaussianNaiveBayes, LocalClassifier, LocalModel, LogisticRegression, ScoreSeries};
pub use pipeline::Stickleback;
