//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where validation from this crate can fail.

use thiserror::Error;

/// Errors raised by `sg-core` validation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `sg-core`.
pub type CoreResult<T> = Result<T, CoreError>;
