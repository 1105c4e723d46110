//! Tower middleware integration for stashbox.
//!
//! This crate provides [`TransportLayer`], a Tower [`Layer`] that runs the
//! requests of any HTTP client service (for example `hyper-util`'s legacy
//! client) through a [`stashbox::Transport`]: cached responses are served
//! without touching the network, failures are retried, and exchanges can be
//! rate limited.
//!
//! [`Layer`]: tower::Layer
//!
//! # Quick Start
//!
//! ```ignore
//! use stashbox::Transport;
//! use stashbox_fs::FileCache;
//! use stashbox_tower::TransportLayer;
//! use tower::ServiceBuilder;
//!
//! let transport = Transport::builder()
//!     .cache(FileCache::new("/var/cache/crawler"))
//!     .retries(2)
//!     .init()
//!     .await?;
//!
//! let client = ServiceBuilder::new()
//!     .layer(TransportLayer::new(transport))
//!     .service(hyper_client);
//! ```
//!
//! # Main Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TransportLayer`] | Tower `Layer`, the main entry point |
//! | [`service::TransportService`] | The Tower `Service` wrapping the client |
//! | [`TowerUpstream`] | Adapter bridging Tower services to stashbox's upstream interface |
//!
//! Request bodies must be `Clone` so failed attempts can be replayed.

#![warn(missing_docs)]

/// Tower layer sharing one transport between services.
pub mod layer;
/// The Tower service implementation.
pub mod service;
/// Upstream adapter for bridging Tower services to stashbox.
pub mod upstream;

pub use layer::TransportLayer;
pub use service::TransportService;
pub use upstream::TowerUpstream;
