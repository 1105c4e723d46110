use async_trait::async_trait;
use stashbox_core::{BufferedResponse, RequestHead};

use crate::{Cache, CacheError, CacheResult};

/// Cache that stores nothing.
///
/// Every lookup misses and every write succeeds without effect. This is what a
/// transport uses when no cache is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn init(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn get(&self, _request: &RequestHead) -> CacheResult<BufferedResponse> {
        Err(CacheError::NotFound)
    }

    async fn set(&self, _request: &RequestHead, _response: &BufferedResponse) -> CacheResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Method, Response};

    #[tokio::test]
    async fn test_noop_never_hits() {
        let cache = NoopCache;
        let head = RequestHead::new(Method::GET, "http://example.com/".parse().unwrap());

        cache.init().await.unwrap();
        cache
            .set(&head, &Response::new(Bytes::from_static(b"body")))
            .await
            .unwrap();

        let err = cache.get(&head).await.unwrap_err();
        assert!(matches!(err, CacheError::NotFound));
        assert!(err.is_miss());
    }
}
