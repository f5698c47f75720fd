//! Assessment: predicted events vs. true events under a time tolerance.

mod matching;
mod report;

pub use matching::{assess, match_events, Outcome, OutcomeSeries};
pub use report::{OutcomeCounts, OutcomeTable};
