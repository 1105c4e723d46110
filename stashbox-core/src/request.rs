//! Request identity and replay.

use http::header::{HeaderValue, USER_AGENT};
use http::{Method, Request, Uri};

use crate::key::CacheKey;

/// The part of a request that identifies it for caching: method and URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    method: Method,
    uri: Uri,
}

impl RequestHead {
    /// Creates a request head from its method and URL.
    pub fn new(method: Method, uri: Uri) -> Self {
        RequestHead { method, uri }
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full request URL, query included.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Derives the cache key of this request.
    pub fn key(&self) -> CacheKey {
        CacheKey::from_head(self)
    }
}

impl<B> From<&Request<B>> for RequestHead {
    fn from(request: &Request<B>) -> Self {
        RequestHead::new(request.method().clone(), request.uri().clone())
    }
}

/// A request the transport can inspect, decorate and send more than once.
///
/// Implemented for `http::Request<B>` with a cloneable body. Client adapters
/// implement it for their own request types.
pub trait ExchangeRequest: Sized + Send {
    /// Method and URL of the request.
    fn head(&self) -> RequestHead;

    /// Sets the `User-Agent` header, replacing any existing value.
    fn set_user_agent(&mut self, value: HeaderValue);

    /// Produces a copy for another attempt.
    ///
    /// Returns `None` when the body cannot be replayed, which stops retries.
    fn try_clone(&self) -> Option<Self>;
}

impl<B> ExchangeRequest for Request<B>
where
    B: Clone + Send,
{
    fn head(&self) -> RequestHead {
        RequestHead::from(self)
    }

    fn set_user_agent(&mut self, value: HeaderValue) {
        self.headers_mut().insert(USER_AGENT, value);
    }

    fn try_clone(&self) -> Option<Self> {
        Some(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_ignores_headers_and_body() {
        let first = Request::get("http://example.com/a?x=1")
            .header("accept", "text/html")
            .body("one")
            .unwrap();
        let second = Request::get("http://example.com/a?x=1")
            .header("accept", "application/json")
            .body("two")
            .unwrap();

        assert_eq!(first.head(), second.head());
        assert_eq!(first.head().key(), second.head().key());
    }

    #[test]
    fn test_set_user_agent_overrides() {
        let mut request = Request::get("http://example.com/")
            .header(USER_AGENT, "default/1.0")
            .body(())
            .unwrap();

        request.set_user_agent(HeaderValue::from_static("stashbox-test/0.1"));

        let values: Vec<_> = request.headers().get_all(USER_AGENT).iter().collect();
        assert_eq!(values, vec![&HeaderValue::from_static("stashbox-test/0.1")]);
    }

    #[test]
    fn test_try_clone_copies_everything() {
        let request = Request::post("http://example.com/submit")
            .header("x-trace", "abc")
            .body(String::from("payload"))
            .unwrap();

        let copy = request.try_clone().unwrap();
        assert_eq!(copy.method(), request.method());
        assert_eq!(copy.uri(), request.uri());
        assert_eq!(copy.headers(), request.headers());
        assert_eq!(copy.body(), request.body());
    }
}
