//! Clock abstraction and poll parameters.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Source of suspension for the poll loop. Injected so tests can observe
/// sleeps without waiting them out.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Parameters for waiting on a long-running remote operation.
///
/// A fixed interval is deliberate: encoding jobs run for minutes, so the
/// poll overhead is negligible and the worst-case completion-detection
/// latency is one interval.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Pause between polls.
    pub interval: Duration,
    /// Upper bound on accumulated waiting before the loop gives up.
    /// `None` removes the bound.
    pub max_wait: Option<Duration>,
    /// External cancellation signal; checked at every suspension point.
    pub cancel: CancellationToken,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20),
            max_wait: Some(Duration::from_secs(2 * 60 * 60)),
            cancel: CancellationToken::new(),
        }
    }
}

impl PollOptions {
    /// Set the poll interval.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Bound or unbound the total wait.
    pub fn max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Attach a cancellation token.
    pub fn cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
