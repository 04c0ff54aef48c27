//! Error types for core data handling.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("malformed metric identifier {identifier:?}: {reason}")]
    MalformedMetricIdentifier { identifier: String, reason: &'static str },

    #[error("column {column:?} has {actual} values but the index has {expected}")]
    MalformedSeries {
        column: String,
        expected: usize,
        actual: usize,
    },
}
