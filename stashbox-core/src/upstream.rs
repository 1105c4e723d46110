use std::future::Future;

use bytes::Bytes;
use http::Response;

/// The wrapped exchange capability: given a request, produce a buffered
/// response or fail.
///
/// This is the real network transport as seen by the decorator. Client
/// adapters implement it on top of their own service or middleware chain.
///
/// # Examples
///
/// ```rust,ignore
/// use stashbox_core::Upstream;
/// use std::future::Ready;
///
/// struct StaticUpstream {
///     response: http::Response<bytes::Bytes>,
/// }
///
/// impl Upstream<http::Request<()>> for StaticUpstream {
///     type Error = std::convert::Infallible;
///     type Future = Ready<Result<http::Response<bytes::Bytes>, Self::Error>>;
///
///     fn call(&mut self, _req: http::Request<()>) -> Self::Future {
///         std::future::ready(Ok(self.response.clone()))
///     }
/// }
/// ```
pub trait Upstream<Req> {
    /// Error produced when the exchange itself fails.
    type Error;

    /// The future that resolves to the response
    type Future: Future<Output = Result<Response<Bytes>, Self::Error>> + Send;

    /// Perform one exchange.
    fn call(&mut self, req: Req) -> Self::Future;
}
