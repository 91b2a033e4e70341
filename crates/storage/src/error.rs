//! Error types for loading the question pool.

use thiserror::Error;

use quiz_core::model::{LabelError, QuestionError};

/// Why a single data row was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RowError {
    #[error("unreadable record: {0}")]
    Record(String),

    #[error("answer cell is empty")]
    EmptyAnswer,

    #[error("answer {token:?} does not name any option")]
    UnknownLabel { token: String },

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error(transparent)]
    Invalid(#[from] QuestionError),
}

/// Errors surfaced while loading a question source.
///
/// `MalformedRow` is recoverable and only ever appears in `LoadReport::skipped`;
/// the other variants abort the load.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("row {row}: {reason}")]
    MalformedRow { row: usize, reason: RowError },

    #[error("no usable questions in source ({skipped} rows skipped)")]
    EmptyPool { skipped: usize },

    #[error("failed to read question source: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse question source: {0}")]
    Csv(#[from] csv::Error),
}
