//! Periodic tick loop with cooperative cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Drives a recurring job: first tick fires immediately, then every
/// `period` until cancelled.
///
/// Missed ticks are delayed rather than bursted, so a slow cycle never
/// causes back-to-back runs.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    token: CancellationToken,
}

impl Ticker {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            token: CancellationToken::new(),
        }
    }

    /// Token that other tasks can use to stop the loop.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop the loop after the current tick completes.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Run `tick` on schedule until cancelled.
    ///
    /// The tick future is not raced against cancellation; an in-flight
    /// cycle always finishes.
    pub async fn run<F, Fut>(&self, mut tick: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.token.cancelled() => {
                    debug!("Tick loop cancelled");
                    return;
                }
                _ = interval.tick() => {
                    tick().await;
                }
            }
        }
    }
}
