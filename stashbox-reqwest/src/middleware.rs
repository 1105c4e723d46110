//! Transport middleware for reqwest-middleware.

use std::sync::Arc;

use async_trait::async_trait;
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next, Result};
use stashbox::Transport;
use stashbox_backend::{Cache, NoopCache};

use crate::upstream::{ReqwestRequest, ReqwestUpstream};

/// Transport middleware for reqwest-middleware.
///
/// Runs every request through a [`Transport`]: cached responses short-circuit
/// the rest of the chain, failed exchanges are retried, and uncached requests
/// can be rate limited.
///
/// Requests with streaming bodies cannot be replayed and get a single attempt.
/// Responses served by this middleware are fully buffered.
///
/// # Type Parameters
///
/// * `C` - Cache backend (e.g., `NoopCache`, `FileCache`)
pub struct TransportMiddleware<C = NoopCache> {
    transport: Arc<Transport<C>>,
}

impl<C> TransportMiddleware<C> {
    /// Create a new middleware owning `transport`.
    pub fn new(transport: Transport<C>) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Create a new middleware sharing `transport`.
    pub fn from_shared(transport: Arc<Transport<C>>) -> Self {
        Self { transport }
    }
}

impl<C> Clone for TransportMiddleware<C> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
        }
    }
}

#[async_trait]
impl<C> Middleware for TransportMiddleware<C>
where
    C: Cache + 'static,
{
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let request = ReqwestRequest::new(req)?;
        let mut upstream = ReqwestUpstream::new(next, extensions.clone());

        let response = self.transport.exchange(&mut upstream, request).await?;

        Ok(Response::from(response))
    }
}

/// Builds a reqwest client whose requests all go through `transport`.
///
/// The counterpart of constructing a client around a decorated transport; call
/// [`TransportBuilder::init`](stashbox::TransportBuilder::init) first so the
/// cache storage exists.
pub fn client<C>(transport: Transport<C>, client: reqwest::Client) -> ClientWithMiddleware
where
    C: Cache + 'static,
{
    ClientBuilder::new(client)
        .with(TransportMiddleware::new(transport))
        .build()
}
