//! Error types for cache operations.

use thiserror::Error;

use crate::wire::WireError;

/// Error type for cache operations.
///
/// [`NotFound`](CacheError::NotFound) and [`Decode`](CacheError::Decode) are
/// the expected "no usable record" outcomes of a lookup; see
/// [`CacheError::is_miss`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// No record exists for the request.
    #[error("cache record not found")]
    NotFound,

    /// A record exists but is not a valid response.
    #[error("cache record cannot be decoded: {0}")]
    Decode(#[from] WireError),

    /// The storage medium failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl CacheError {
    /// Wraps a backend-specific failure.
    pub fn internal(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        CacheError::Internal(err.into())
    }

    /// Whether this error means "serve from the network instead".
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::NotFound | CacheError::Decode(_))
    }
}
