//! Error types for VizAI activity aggregation

use thiserror::Error;

/// Errors that can occur while preparing input for aggregation or encoding a report.
///
/// The aggregation functions themselves are infallible; everything here is raised
/// at the parsing, configuration, or persistence boundary.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Failed to parse activity payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid timezone offset: {0}")]
    InvalidTimezone(String),

    #[error("Invalid day window: {0}")]
    InvalidWindow(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Store error: {0}")]
    StoreError(String),
}
