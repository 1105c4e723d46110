use std::fmt;
use std::sync::Arc;

use http::{HeaderValue, StatusCode};
use stashbox_backend::{Cache, CacheError, CacheResult, NoopCache};
use stashbox_core::{BufferedResponse, ExchangeRequest, Upstream};
use tracing::{debug, error, trace, warn};

use crate::rate_limit::RateLimiter;

/// Decorates an [`Upstream`] exchange with caching, retry and rate limiting.
///
/// Each call to [`exchange`](Transport::exchange) runs:
///
/// 1. cache lookup; a hit is returned as is, nothing else happens
/// 2. `User-Agent` override, when configured
/// 3. one rate limiter token, when configured
/// 4. the exchange, repeated up to `retries` more times while it fails or
///    answers with a status of 400 or above
/// 5. write-through of responses below 400
///
/// Retries are immediate and treat every failure alike. A final response with
/// an error status is returned as a response, not as an error.
pub struct Transport<C = NoopCache> {
    cache: C,
    retries: usize,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    user_agent: Option<HeaderValue>,
}

impl Transport<NoopCache> {
    /// Starts building a transport without cache, retries or rate limiting.
    pub fn builder() -> TransportBuilder<NoopCache> {
        TransportBuilder::default()
    }
}

impl Default for Transport<NoopCache> {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl<C> Transport<C> {
    /// The configured cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// How many times a failed exchange is repeated.
    pub fn retries(&self) -> usize {
        self.retries
    }

    /// The `User-Agent` sent on every exchange, if overridden.
    pub fn user_agent(&self) -> Option<&HeaderValue> {
        self.user_agent.as_ref()
    }

    /// Whether exchanges wait for rate limiter tokens.
    pub fn is_rate_limited(&self) -> bool {
        self.rate_limiter.is_some()
    }
}

impl<C> Transport<C>
where
    C: Cache,
{
    /// Prepares the cache storage. Safe to call more than once.
    pub async fn init(&self) -> CacheResult<()> {
        self.cache.init().await
    }

    /// Performs one decorated exchange through `upstream`.
    ///
    /// Only a failure of the final attempt is returned as an error. Cache
    /// failures are never surfaced.
    pub async fn exchange<R, U>(
        &self,
        upstream: &mut U,
        mut request: R,
    ) -> Result<BufferedResponse, U::Error>
    where
        R: ExchangeRequest,
        U: Upstream<R>,
    {
        let head = request.head();
        let cache = self.cache.name();

        match self.cache.get(&head).await {
            Ok(response) => {
                debug!(cache, uri = %head.uri(), status = response.status().as_u16(), "cache hit");
                return Ok(response);
            }
            Err(CacheError::NotFound) => {
                trace!(cache, uri = %head.uri(), "cache miss");
            }
            Err(err) if err.is_miss() => {
                debug!(cache, uri = %head.uri(), error = %err, "cache record unusable");
            }
            Err(err) => {
                warn!(cache, uri = %head.uri(), error = %err, "cache lookup failed");
            }
        }

        if let Some(user_agent) = &self.user_agent {
            request.set_user_agent(user_agent.clone());
        }
        if let Some(rate_limiter) = &self.rate_limiter {
            rate_limiter.acquire().await;
        }

        let response = self.send(upstream, request).await?;

        if !is_failure(response.status()) {
            if let Err(err) = self.cache.set(&head, &response).await {
                error!(cache, uri = %head.uri(), error = %err, "cache write failed");
            }
        }
        Ok(response)
    }

    async fn send<R, U>(&self, upstream: &mut U, mut request: R) -> Result<BufferedResponse, U::Error>
    where
        R: ExchangeRequest,
        U: Upstream<R>,
    {
        let mut attempt = 1;
        loop {
            let may_retry = attempt <= self.retries;
            let replay = if may_retry { request.try_clone() } else { None };

            let result = upstream.call(request).await;
            let failed = match &result {
                Ok(response) => is_failure(response.status()),
                Err(_) => true,
            };
            if !failed {
                return result;
            }

            match replay {
                Some(next) => {
                    match &result {
                        Ok(response) => {
                            debug!(attempt, status = response.status().as_u16(), "exchange answered with error status, retrying")
                        }
                        Err(_) => debug!(attempt, "exchange failed, retrying"),
                    }
                    request = next;
                    attempt += 1;
                }
                None => {
                    if may_retry {
                        warn!(attempt, "request body cannot be replayed, giving up retries");
                    }
                    return result;
                }
            }
        }
    }
}

impl<C> fmt::Debug for Transport<C>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("cache", &self.cache)
            .field("retries", &self.retries)
            .field("rate_limiter", &self.rate_limiter.as_ref().map(|_| "..."))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn is_failure(status: StatusCode) -> bool {
    status.as_u16() >= 400
}

/// Builder for [`Transport`].
///
/// ```
/// use std::time::Duration;
/// use http::HeaderValue;
/// use stashbox::Transport;
/// use stashbox::rate_limit::Ticker;
/// use stashbox_fs::FileCache;
///
/// let transport = Transport::builder()
///     .cache(FileCache::new("/tmp/stashbox-doc"))
///     .retries(3)
///     .rate_limiter(Ticker::new(Duration::from_millis(250)))
///     .user_agent(HeaderValue::from_static("crawler/1.0"))
///     .build();
/// assert_eq!(transport.retries(), 3);
/// ```
pub struct TransportBuilder<C = NoopCache> {
    cache: C,
    retries: usize,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    user_agent: Option<HeaderValue>,
}

impl Default for TransportBuilder<NoopCache> {
    fn default() -> Self {
        Self {
            cache: NoopCache,
            retries: 0,
            rate_limiter: None,
            user_agent: None,
        }
    }
}

impl<C> TransportBuilder<C> {
    /// Cache consulted before and updated after every exchange.
    pub fn cache<NC>(self, cache: NC) -> TransportBuilder<NC>
    where
        NC: Cache,
    {
        TransportBuilder {
            cache,
            retries: self.retries,
            rate_limiter: self.rate_limiter,
            user_agent: self.user_agent,
        }
    }

    /// Extra attempts after a failed exchange. `0` means a single attempt.
    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    /// Token source awaited once before the first attempt of every exchange.
    pub fn rate_limiter(mut self, rate_limiter: impl RateLimiter + 'static) -> Self {
        self.rate_limiter = Some(Arc::new(rate_limiter));
        self
    }

    /// Overrides the `User-Agent` header of every outgoing request.
    pub fn user_agent(mut self, user_agent: HeaderValue) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Creates the transport without touching the cache storage.
    pub fn build(self) -> Transport<C> {
        Transport {
            cache: self.cache,
            retries: self.retries,
            rate_limiter: self.rate_limiter,
            user_agent: self.user_agent,
        }
    }

    /// Creates the transport and prepares its cache storage.
    pub async fn init(self) -> CacheResult<Transport<C>>
    where
        C: Cache,
    {
        let transport = self.build();
        transport.init().await?;
        Ok(transport)
    }
}
