//! Store error type.

use thiserror::Error;

use sg_core::PlaceKey;
use sg_network::NetworkError;

/// Errors produced by `sg-store`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("{0} not found")]
    PlaceNotFound(PlaceKey),

    #[error("indexes have not been provisioned")]
    NotProvisioned,

    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("snapshot is inconsistent: {0}")]
    Inconsistent(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
