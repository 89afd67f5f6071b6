use serde::Serialize;
use thiserror::Error;

/// Errors raised while resolving, loading, or filtering a city dataset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("Unknown city '{0}'")]
    UnknownCity(String),

    /// A row whose start time or duration could not be interpreted.
    /// `row` is the zero-based data row (header excluded).
    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("Unknown time of day '{0}' (expected morning, afternoon, evening, night or all)")]
    UnknownTimeBucket(String),
}

/// Errors raised by the statistics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum StatsError {
    #[error("No data for these filters")]
    EmptyDataset,
}

pub type StatResult<T> = Result<T, StatsError>;
