//! HTTP client transport decorator.
//!
//! Stashbox wraps the exchange performed by an HTTP client and adds three
//! independent behaviors to it:
//!
//! - **Read-through / write-through caching** of successful responses, keyed
//!   by request method and URL ([`stashbox_backend::Cache`]).
//! - **Bounded retry**: failed exchanges and responses with a status of 400 or
//!   above are repeated a fixed number of times, without delay.
//! - **Rate limiting**: an optional token source awaited before every uncached
//!   exchange ([`rate_limit::RateLimiter`]).
//!
//! The [`Transport`] is client agnostic. `stashbox-tower` and
//! `stashbox-reqwest` plug it into tower services and reqwest clients.
//!
//! ```no_run
//! use stashbox::Transport;
//! use stashbox_fs::FileCache;
//!
//! # async fn run() -> Result<(), stashbox_backend::CacheError> {
//! let transport = Transport::builder()
//!     .cache(FileCache::new("/var/cache/crawler"))
//!     .retries(2)
//!     .init()
//!     .await?;
//! # drop(transport);
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

/// Declarative configuration resolved into a [`Transport`].
pub mod config;

/// Token sources throttling exchanges.
pub mod rate_limit;

mod transport;

pub use config::{ConfigError, TransportConfig};
pub use transport::{Transport, TransportBuilder};

pub use stashbox_backend::{Cache, CacheError, NoopCache};
pub use stashbox_core::{BufferedResponse, CacheKey, ExchangeRequest, RequestHead, Upstream};
