//! stashbox transport for [reqwest](https://docs.rs/reqwest).
//!
//! ```no_run
//! use stashbox::Transport;
//! use stashbox_fs::FileCache;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Transport::builder()
//!     .cache(FileCache::new("/var/cache/crawler"))
//!     .retries(2)
//!     .init()
//!     .await?;
//!
//! let client = stashbox_reqwest::client(transport, reqwest::Client::new());
//! let body = client.get("https://example.com/").send().await?.text().await?;
//! # drop(body);
//! # Ok(())
//! # }
//! ```

mod middleware;
mod upstream;

pub use middleware::{TransportMiddleware, client};
pub use upstream::{ReqwestRequest, ReqwestUpstream, buffer_response};

// Re-export common types
pub use stashbox::{Transport, TransportBuilder};
