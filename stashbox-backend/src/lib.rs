//! Cache abstraction for stashbox.
//!
//! If you want to implement your own cache backend, you are in the right place:
//! implement [`Cache`] and hand it to the transport builder. [`wire`] holds the
//! record format shared by persistent backends.
mod cache;
mod error;
mod noop;
pub mod wire;

pub use cache::{Cache, CacheResult};
pub use error::CacheError;
pub use noop::NoopCache;
pub use wire::WireError;
