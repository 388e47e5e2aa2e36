//! Ingestion error types.
//!
//! [`RowError`] describes why a single record was skipped; it is counted in
//! a report and never aborts a load.  [`IngestError`] is returned when a whole
//! batch had to be dropped.

use thiserror::Error;

use sg_network::NetworkError;
use sg_store::StoreError;

/// Why one record was skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("required key `{field}` is missing")]
    MissingKey { field: &'static str },

    #[error("field `{field}`: {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error("road segment references unknown intersection osmid {osmid}")]
    Dangling { osmid: i64 },
}

impl RowError {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        RowError::Malformed { field, reason: reason.into() }
    }
}

pub type RowResult<T> = Result<T, RowError>;

/// Errors that drop the in-flight batch.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not publish batch: {0}")]
    Publish(String),
}

pub type IngestResult<T> = Result<T, IngestError>;
