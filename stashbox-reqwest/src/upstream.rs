//! Upstream wrapper for reqwest-middleware's Next type.

use std::future::Future;
use std::pin::Pin;

use http::header::{HeaderValue, USER_AGENT};
use http::{Extensions, Uri};
use reqwest_middleware::{Error, Next, Result};
use stashbox_core::{BufferedResponse, ExchangeRequest, RequestHead, Upstream};

/// A `reqwest::Request` the transport can replay.
///
/// The URL is converted once up front, since every attempt and the cache key
/// need it.
pub struct ReqwestRequest {
    request: reqwest::Request,
    uri: Uri,
}

impl ReqwestRequest {
    /// Wraps a request; fails if its URL is not a valid `http::Uri`.
    pub fn new(request: reqwest::Request) -> Result<Self> {
        let uri = Uri::try_from(request.url().as_str()).map_err(Error::middleware)?;
        Ok(Self { request, uri })
    }

    /// The wrapped request.
    pub fn into_inner(self) -> reqwest::Request {
        self.request
    }
}

impl ExchangeRequest for ReqwestRequest {
    fn head(&self) -> RequestHead {
        RequestHead::new(self.request.method().clone(), self.uri.clone())
    }

    fn set_user_agent(&mut self, value: HeaderValue) {
        self.request.headers_mut().insert(USER_AGENT, value);
    }

    fn try_clone(&self) -> Option<Self> {
        self.request.try_clone().map(|request| Self {
            request,
            uri: self.uri.clone(),
        })
    }
}

/// Upstream wrapper that bridges reqwest-middleware's `Next<'a>` to stashbox's
/// `Upstream` trait.
///
/// Each attempt runs the rest of the middleware chain with its own copy of the
/// request extensions and buffers the response body.
pub struct ReqwestUpstream<'a> {
    next: Next<'a>,
    extensions: Extensions,
}

impl<'a> ReqwestUpstream<'a> {
    /// Create a new upstream wrapper.
    pub fn new(next: Next<'a>, extensions: Extensions) -> Self {
        Self { next, extensions }
    }
}

impl<'a> Upstream<ReqwestRequest> for ReqwestUpstream<'a> {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<BufferedResponse>> + Send + 'a>>;

    fn call(&mut self, req: ReqwestRequest) -> Self::Future {
        let next = self.next.clone();
        let mut extensions = self.extensions.clone();

        Box::pin(async move {
            let response = next.run(req.into_inner(), &mut extensions).await?;
            buffer_response(response).await
        })
    }
}

/// Reads the whole body of a reqwest response.
pub async fn buffer_response(response: reqwest::Response) -> Result<BufferedResponse> {
    let status = response.status();
    let version = response.version();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    let mut buffered = http::Response::new(body);
    *buffered.status_mut() = status;
    *buffered.version_mut() = version;
    *buffered.headers_mut() = headers;
    Ok(buffered)
}
