//! Filesystem cache backend for stashbox.
//!
//! [`FileCache`] persists every successful response as a human-readable file
//! under a root directory. See [`stashbox_backend::wire`] for the record format.
#![warn(missing_docs)]

mod backend;
mod error;

pub use backend::{FileCache, FileCacheBuilder};
pub use error::FileCacheError;
