//! Upstream adapter for bridging Tower services to stashbox.
//!
//! Users typically don't interact with this module directly, it's used
//! internally by [`TransportService`](crate::service::TransportService).

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response};
use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use stashbox_core::{BufferedResponse, Upstream};
use tower::{BoxError, Service, ServiceExt};

/// Adapter that implements stashbox's [`Upstream`] trait for Tower services.
///
/// Every call clones the wrapped service, waits for it to become ready, sends
/// the request and buffers the whole response body. A body that fails halfway
/// counts as a failed exchange.
///
/// # Type Parameters
///
/// * `S` - The Tower service being adapted
pub struct TowerUpstream<S> {
    service: S,
}

impl<S> TowerUpstream<S> {
    /// Creates a new upstream adapter wrapping the given service.
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

impl<S, ReqBody, ResBody> Upstream<Request<ReqBody>> for TowerUpstream<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    ReqBody: Send + 'static,
    ResBody: HttpBody + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Into<BoxError>,
{
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<BufferedResponse, BoxError>>;

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let service = self.service.clone();
        Box::pin(async move {
            let response = service.oneshot(req).await.map_err(Into::<BoxError>::into)?;
            let (parts, body) = response.into_parts();
            let body: Bytes = body.collect().await.map_err(Into::<BoxError>::into)?.to_bytes();
            Ok(Response::from_parts(parts, body))
        })
    }
}
