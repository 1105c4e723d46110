#![warn(missing_docs)]
//! # stashbox-core
//!
//! Core types shared by every stashbox crate.
//!
//! Stashbox decorates an outbound HTTP exchange with read-through/write-through
//! caching, bounded retry and optional rate limiting. This crate holds the
//! pieces every other crate agrees on:
//!
//! - **Identify** a request for caching ([`RequestHead`], [`CacheKey`])
//! - **Replay** and decorate a request across attempts ([`ExchangeRequest`])
//! - **Call** the wrapped network transport ([`Upstream`])

pub mod key;
pub mod request;
pub mod upstream;

pub use key::CacheKey;
pub use request::{ExchangeRequest, RequestHead};
pub use upstream::Upstream;

/// Fully buffered HTTP response, the unit stored in and served from caches.
pub type BufferedResponse = http::Response<bytes::Bytes>;
