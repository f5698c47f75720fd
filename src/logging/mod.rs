//! Structured logging: tracing subscriber setup and ndjson report lines.

mod format;

pub use format::{ReportLine, StructuredLogger};
