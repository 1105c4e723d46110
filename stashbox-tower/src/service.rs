use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response};
use http_body::Body as HttpBody;
use http_body_util::Full;
use stashbox::Transport;
use stashbox_backend::Cache;
use tower::{BoxError, Service};

use crate::upstream::TowerUpstream;

/// The Tower service running every request through a [`Transport`].
///
/// Responses are fully buffered, whether they come from the cache or from the
/// wrapped service.
pub struct TransportService<S, C> {
    inner: S,
    transport: Arc<Transport<C>>,
}

impl<S, C> TransportService<S, C> {
    /// Wraps `inner` with a shared transport.
    pub fn new(inner: S, transport: Arc<Transport<C>>) -> Self {
        TransportService { inner, transport }
    }

    /// The wrapped service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S, C> Clone for TransportService<S, C>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<S, C, ReqBody, ResBody> Service<Request<ReqBody>> for TransportService<S, C>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    C: Cache + 'static,
    ReqBody: Clone + Send + 'static,
    ResBody: HttpBody + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // cache hits never reach the inner service; each attempt awaits its
        // readiness on a clone
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let transport = Arc::clone(&self.transport);
        let mut upstream = TowerUpstream::new(self.inner.clone());

        Box::pin(async move {
            let response = transport.exchange(&mut upstream, req).await?;
            Ok(response.map(Full::new))
        })
    }
}
