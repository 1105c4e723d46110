use std::sync::Arc;

use stashbox::Transport;
use stashbox_backend::NoopCache;
use tower::Layer;

use crate::service::TransportService;

/// Tower [`Layer`] applying a [`Transport`] to an HTTP client service.
///
/// All services produced by one layer share the same transport, and with it
/// the same cache and rate limiter.
pub struct TransportLayer<C = NoopCache> {
    transport: Arc<Transport<C>>,
}

impl<C> TransportLayer<C> {
    /// Layer owning `transport`.
    pub fn new(transport: Transport<C>) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Layer sharing a transport with other layers or adapters.
    pub fn from_shared(transport: Arc<Transport<C>>) -> Self {
        TransportLayer { transport }
    }
}

impl<C> Clone for TransportLayer<C> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<S, C> Layer<S> for TransportLayer<C> {
    type Service = TransportService<S, C>;

    fn layer(&self, inner: S) -> Self::Service {
        TransportService::new(inner, Arc::clone(&self.transport))
    }
}
