use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::OrCancelExt;

/// Trailing-edge debouncer.
///
/// Every [`push`](Debouncer::push) restarts the quiet period. Once `quiet`
/// elapses with no further pushes, `on_settle` receives the latest value.
/// The initial value never settles on its own.
pub struct Debouncer<T> {
    tx: watch::Sender<T>,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn spawn<F, Fut>(initial: T, quiet: Duration, mut on_settle: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = watch::channel(initial);
        let token = CancellationToken::new();
        let child = token.clone();
        let handle = tokio::spawn(async move {
            'outer: loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                loop {
                    tokio::select! {
                        biased;
                        _ = child.cancelled() => break 'outer,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                break 'outer;
                            }
                        }
                        _ = tokio::time::sleep(quiet) => break,
                    }
                }
                let value = rx.borrow_and_update().clone();
                if on_settle(value).or_cancel(&child).await.is_err() {
                    break;
                }
            }
        });
        Self { tx, token, handle }
    }

    /// Replace the pending value and restart the quiet period.
    pub fn push(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Latest pushed value, settled or not.
    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Reset the pending value without scheduling a settle.
    pub fn reset(&self, value: T) {
        self.tx.send_if_modified(|current| {
            *current = value;
            false
        });
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
