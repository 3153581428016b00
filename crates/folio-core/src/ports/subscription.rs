//! Live query handle.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, Stream, StreamExt};
use tokio::sync::mpsc;

use crate::error::RepoError;

/// A live stream of full snapshots.
///
/// The first item is the state at subscription time; every relevant change
/// yields one more complete snapshot. Dropping the handle (or calling
/// [`Subscription::close`]) releases the underlying watch.
pub struct Subscription<T, E = RepoError> {
    inner: BoxStream<'static, Result<T, E>>,
}

impl<T, E> Subscription<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// Wrap the receiving end of a watcher's channel. The watcher sees the
    /// channel close once this subscription is dropped.
    pub fn from_receiver(rx: mpsc::Receiver<Result<T, E>>) -> Self {
        Self::new(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        }))
    }

    /// Transform every snapshot, keeping the same underlying watch.
    pub fn map_snapshots<U, F>(self, mut f: F) -> Subscription<U, E>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        Subscription::new(self.inner.map(move |item| item.map(&mut f)))
    }

    /// Convert the error type, keeping the same underlying watch.
    pub fn map_err<E2, F>(self, f: F) -> Subscription<T, E2>
    where
        E2: Send + 'static,
        F: FnMut(E) -> E2 + Send + 'static,
    {
        let mut f = f;
        Subscription::new(self.inner.map(move |item| item.map_err(&mut f)))
    }

    /// Wait for the next snapshot. `None` once the watch has ended.
    pub async fn next_snapshot(&mut self) -> Option<Result<T, E>> {
        self.inner.next().await
    }

    /// Release the watch.
    pub fn close(self) {
        drop(self);
    }
}

impl<T, E> Stream for Subscription<T, E> {
    type Item = Result<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl<T, E> std::fmt::Debug for Subscription<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_receiver_items_in_order() {
        let (tx, rx) = mpsc::channel::<Result<u32, RepoError>>(4);
        let mut sub = Subscription::from_receiver(rx);

        tx.send(Ok(1)).await.unwrap();
        tx.send(Ok(2)).await.unwrap();
        drop(tx);

        assert_eq!(sub.next_snapshot().await.unwrap().unwrap(), 1);
        assert_eq!(sub.next_snapshot().await.unwrap().unwrap(), 2);
        assert!(sub.next_snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_close_is_seen_by_sender() {
        let (tx, rx) = mpsc::channel::<Result<u32, RepoError>>(1);
        let sub = Subscription::from_receiver(rx);

        sub.close();
        tx.closed().await;
        assert!(tx.send(Ok(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_map_snapshots_and_errors() {
        let (tx, rx) = mpsc::channel::<Result<u32, String>>(2);
        let mut sub = Subscription::from_receiver(rx)
            .map_snapshots(|n| n * 10)
            .map_err(RepoError::NotConfigured);

        tx.send(Ok(4)).await.unwrap();
        tx.send(Err("down".to_string())).await.unwrap();

        assert_eq!(sub.next_snapshot().await.unwrap().unwrap(), 40);
        assert!(sub.next_snapshot().await.unwrap().unwrap_err().is_not_configured());
    }
}
