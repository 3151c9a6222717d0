//! Timing primitives shared by the helpdesk client: a cancellation
//! extension for futures, a cancellable interval [`Poller`], and a trailing
//! edge [`Debouncer`].

mod debounce;
mod poller;

pub use debounce::Debouncer;
pub use poller::Poller;

use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Error returned when a future is cancelled.
#[derive(Debug, PartialEq, Eq)]
pub enum CancelErr {
    Cancelled,
}

/// Extension trait for making futures cancellable.
///
/// Races any future against a `CancellationToken`, returning
/// `Err(CancelErr::Cancelled)` if the token fires first. A future that
/// loses the race is dropped.
#[async_trait]
pub trait OrCancelExt: Sized {
    type Output;

    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, CancelErr>;
}

#[async_trait]
impl<F> OrCancelExt for F
where
    F: Future + Send,
    F::Output: Send,
{
    type Output = F::Output;

    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, CancelErr> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(CancelErr::Cancelled),
            res = self => Ok(res),
        }
    }
}
