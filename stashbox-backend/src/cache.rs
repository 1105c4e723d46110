use std::sync::Arc;

use async_trait::async_trait;
use stashbox_core::{BufferedResponse, RequestHead};

use crate::CacheError;

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Storage for buffered responses, keyed by request method and URL.
///
/// Every backend satisfies the same three-operation contract:
///
/// - [`init`](Cache::init) prepares storage. It is idempotent and fails only
///   when the storage medium cannot be prepared.
/// - [`get`](Cache::get) returns the stored response or a
///   [miss](CacheError::is_miss). It never mutates state.
/// - [`set`](Cache::set) stores a response, replacing any previous record for
///   the same request.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Prepares the underlying storage.
    async fn init(&self) -> CacheResult<()>;

    /// Looks up the response recorded for `request`.
    async fn get(&self, request: &RequestHead) -> CacheResult<BufferedResponse>;

    /// Records `response` for `request`.
    async fn set(&self, request: &RequestHead, response: &BufferedResponse) -> CacheResult<()>;

    /// Name of this cache, used in log records.
    fn name(&self) -> &str {
        "cache"
    }
}

#[async_trait]
impl<C> Cache for &C
where
    C: Cache + ?Sized,
{
    async fn init(&self) -> CacheResult<()> {
        (**self).init().await
    }

    async fn get(&self, request: &RequestHead) -> CacheResult<BufferedResponse> {
        (**self).get(request).await
    }

    async fn set(&self, request: &RequestHead, response: &BufferedResponse) -> CacheResult<()> {
        (**self).set(request, response).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<C> Cache for Arc<C>
where
    C: Cache + ?Sized,
{
    async fn init(&self) -> CacheResult<()> {
        (**self).init().await
    }

    async fn get(&self, request: &RequestHead) -> CacheResult<BufferedResponse> {
        (**self).get(request).await
    }

    async fn set(&self, request: &RequestHead, response: &BufferedResponse) -> CacheResult<()> {
        (**self).set(request, response).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<C> Cache for Box<C>
where
    C: Cache + ?Sized,
{
    async fn init(&self) -> CacheResult<()> {
        (**self).init().await
    }

    async fn get(&self, request: &RequestHead) -> CacheResult<BufferedResponse> {
        (**self).get(request).await
    }

    async fn set(&self, request: &RequestHead, response: &BufferedResponse) -> CacheResult<()> {
        (**self).set(request, response).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
