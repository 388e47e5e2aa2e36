//! Graph-store and routing error type.

use thiserror::Error;

use sg_core::NodeId;

/// Errors produced by `sg-network`.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("road segment references unknown intersection osmid {osmid}")]
    DanglingReference { osmid: i64 },

    #[error("intersection osmid {osmid} has no location")]
    MissingLocation { osmid: i64 },

    #[error("invalid segment length {length}: must be finite and >= 0")]
    InvalidLength { length: f64 },

    #[error("node {0} not found in graph")]
    NodeNotFound(NodeId),

    #[error("route search exceeded its deadline after settling {settled} intersections")]
    Timeout { settled: usize },

    #[error("graph capacity exceeded: {0}")]
    Capacity(String),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
