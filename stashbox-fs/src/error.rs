use thiserror::Error;

/// Errors that can occur when configuring a [`FileCache`](crate::FileCache).
#[derive(Debug, Error)]
pub enum FileCacheError {
    /// The builder was finished without a root directory.
    #[error("cache root directory is not set")]
    MissingRoot,

    /// The provided configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
