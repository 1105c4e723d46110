use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Interval, MissedTickBehavior};

/// Blocking source of permission tokens.
///
/// [`acquire`](RateLimiter::acquire) waits, without timeout, until one token is
/// available and consumes it. Dropping the future is the only way to cancel.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Waits for one token.
    async fn acquire(&self);
}

#[async_trait]
impl<L> RateLimiter for Arc<L>
where
    L: RateLimiter + ?Sized,
{
    async fn acquire(&self) {
        (**self).acquire().await
    }
}

/// Tokens delivered through a channel; every received item is one token.
///
/// Once all senders are dropped the channel stops throttling.
///
/// ```
/// use stashbox::rate_limit::TokenChannel;
///
/// let (tokens, limiter) = TokenChannel::<()>::bounded(8);
/// # drop((tokens, limiter));
/// ```
#[derive(Debug)]
pub struct TokenChannel<T> {
    receiver: Mutex<mpsc::Receiver<T>>,
}

impl<T> TokenChannel<T> {
    /// Wraps an existing receiver.
    pub fn new(receiver: mpsc::Receiver<T>) -> Self {
        TokenChannel {
            receiver: Mutex::new(receiver),
        }
    }

    /// Creates a channel holding up to `capacity` unclaimed tokens.
    pub fn bounded(capacity: usize) -> (mpsc::Sender<T>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self::new(receiver))
    }
}

#[async_trait]
impl<T> RateLimiter for TokenChannel<T>
where
    T: Send,
{
    async fn acquire(&self) {
        let mut receiver = self.receiver.lock().await;
        if receiver.recv().await.is_none() {
            tracing::trace!("token channel closed, not throttling");
        }
    }
}

/// One token per fixed period.
///
/// The first token is available immediately; a caller arriving late does not
/// build up a burst of missed tokens.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    interval: Mutex<Option<Interval>>,
}

impl Ticker {
    /// Ticker releasing one token every `period`.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(period: Duration) -> Self {
        assert!(!period.is_zero(), "ticker period must be non-zero");
        Ticker {
            period,
            interval: Mutex::new(None),
        }
    }

    /// Time between two tokens.
    pub fn period(&self) -> Duration {
        self.period
    }
}

#[async_trait]
impl RateLimiter for Ticker {
    async fn acquire(&self) {
        let mut interval = self.interval.lock().await;
        // created lazily so a ticker can be built outside of a runtime
        let interval = interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Instant, timeout};

    #[tokio::test]
    async fn test_token_channel_blocks_until_token() {
        let (tokens, limiter) = TokenChannel::bounded(4);

        tokens.send(()).await.unwrap();
        timeout(Duration::from_millis(50), limiter.acquire())
            .await
            .expect("token was available");

        assert!(
            timeout(Duration::from_millis(50), limiter.acquire())
                .await
                .is_err(),
            "no token left, acquire must block"
        );

        tokens.send(()).await.unwrap();
        timeout(Duration::from_millis(50), limiter.acquire())
            .await
            .expect("token was released");
    }

    #[tokio::test]
    async fn test_closed_channel_stops_throttling() {
        let (tokens, limiter) = TokenChannel::<()>::bounded(1);
        drop(tokens);

        timeout(Duration::from_millis(50), async {
            limiter.acquire().await;
            limiter.acquire().await;
        })
        .await
        .expect("closed channel never blocks");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_spaces_tokens() {
        let ticker = Ticker::new(Duration::from_secs(1));
        let start = Instant::now();

        ticker.acquire().await;
        ticker.acquire().await;
        ticker.acquire().await;

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn test_ticker_rejects_zero_period() {
        Ticker::new(Duration::ZERO);
    }
}
