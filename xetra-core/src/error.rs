//! Structured error types for data operations.
//!
//! Every stage of a run (store access, decoding, planning) reports through
//! [`DataError`]. Nothing in the pipeline recovers locally; the first error
//! aborts the run and is surfaced to the operator as-is.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("object not found: {container}/{key}")]
    NotFound { container: String, key: String },

    #[error("cannot decode '{key}': {reason}")]
    Decode { key: String, reason: String },

    #[error("cannot write '{key}': {reason}")]
    Write { key: String, reason: String },

    #[error("no unprocessed source dates between {start} and {end}")]
    EmptyResult { start: NaiveDate, end: NaiveDate },

    #[error("storage I/O error: {0}")]
    Io(String),
}

impl DataError {
    pub fn decode(key: impl Into<String>, reason: impl ToString) -> Self {
        DataError::Decode {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(key: impl Into<String>, reason: impl ToString) -> Self {
        DataError::Write {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}
