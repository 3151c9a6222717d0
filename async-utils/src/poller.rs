use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Runs an async callback on a fixed interval until stopped or dropped.
///
/// The first tick fires one full interval after spawning; callers that want
/// an immediate load do it themselves before starting the poller. Stopping
/// only prevents future ticks: a tick already running is allowed to finish.
pub struct Poller {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl Poller {
    pub fn spawn<F, Fut>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tick().await;
                if child.is_cancelled() {
                    break;
                }
            }
            tracing::trace!(?interval, "poller stopped");
        });
        Self {
            token,
            handle: Some(handle),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop polling and wait for an in-progress tick to drain.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(err) = handle.await
        {
            tracing::warn!("poller task ended abnormally: {err}");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
