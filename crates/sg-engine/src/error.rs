//! Caller-facing error type.
//!
//! Every lower-level error folds into one of these kinds:
//!
//! | Kind                 | Raised when                                             |
//! |----------------------|---------------------------------------------------------|
//! | `MalformedRecord`    | an entity handed to the engine is structurally invalid  |
//! | `DanglingReference`  | a segment names an unknown intersection                 |
//! | `UnroutableEndpoint` | a route endpoint has no nearest-intersection association |
//! | `NotFound`           | an unknown id was passed to a lookup or route           |
//! | `Timeout`            | a route search outlived its deadline                    |
//! | `Storage`            | persistence, CSV I/O or snapshot publication failed     |
//! | `InvalidQuery`       | query parameters rejected before touching an index      |
//! | `NotProvisioned`     | indexes are needed but `provision()` was never called   |
//!
//! An empty route is not an error.

use thiserror::Error;

use sg_core::CoreError;
use sg_ingest::IngestError;
use sg_network::NetworkError;
use sg_store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("road segment references unknown intersection osmid {osmid}")]
    DanglingReference { osmid: i64 },

    #[error("{id} has no nearest intersection and cannot be routed")]
    UnroutableEndpoint { id: i64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("route search timed out")]
    Timeout,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("indexes have not been provisioned")]
    NotProvisioned,
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<CoreError> for EngineError {
    fn from(e: CoreError) -> Self {
        EngineError::InvalidQuery(e.to_string())
    }
}

impl From<NetworkError> for EngineError {
    fn from(e: NetworkError) -> Self {
        match e {
            NetworkError::DanglingReference { osmid } => EngineError::DanglingReference { osmid },
            NetworkError::Timeout { .. } => EngineError::Timeout,
            NetworkError::NodeNotFound(node) => EngineError::NotFound(node.to_string()),
            e @ (NetworkError::MissingLocation { .. } | NetworkError::InvalidLength { .. }) => {
                EngineError::MalformedRecord(e.to_string())
            }
            e @ NetworkError::Capacity(_) => EngineError::Storage(e.to_string()),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Network(e) => e.into(),
            StoreError::PlaceNotFound(key) => EngineError::NotFound(key.to_string()),
            StoreError::NotProvisioned => EngineError::NotProvisioned,
            e @ (StoreError::Format(_) | StoreError::Inconsistent(_) | StoreError::Io(_)) => {
                EngineError::Storage(e.to_string())
            }
        }
    }
}

impl From<IngestError> for EngineError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Store(e) => e.into(),
            IngestError::Network(e) => e.into(),
            e @ (IngestError::Csv(_) | IngestError::Io(_) | IngestError::Publish(_)) => {
                EngineError::Storage(e.to_string())
            }
        }
    }
}
