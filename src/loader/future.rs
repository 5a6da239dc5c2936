use crate::loader::LoadError;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Cloneable thunk for one key within one scope
///
/// Every caller that loads the same key before settlement receives a clone of
/// the same `LoadFuture`; all clones observe the single settlement performed
/// by the dispatch step. Awaiting an already-settled future returns the
/// cached result immediately (the scope-cache hit path).
pub struct LoadFuture<V: Clone + 'static> {
    inner: Shared<BoxFuture<'static, Result<V, LoadError>>>,
}

impl<V> LoadFuture<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Wrap the receiving half of a pending request's channel
    ///
    /// If the sending half is dropped without settling (the scope ended
    /// first), the future settles with `LoadError::Cancelled`.
    pub(crate) fn pending(rx: oneshot::Receiver<Result<V, LoadError>>) -> Self {
        let fut = async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(LoadError::Cancelled),
            }
        }
        .boxed();
        Self { inner: fut.shared() }
    }

    /// A future that is already settled with the given result
    ///
    /// Used for loads issued after the scope was cancelled.
    pub(crate) fn settled(result: Result<V, LoadError>) -> Self {
        Self {
            inner: std::future::ready(result).boxed().shared(),
        }
    }
}

impl<V: Clone + 'static> Clone for LoadFuture<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V> Future for LoadFuture<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Output = Result<V, LoadError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Shared is Unpin, so projecting through get_mut is fine
        Pin::new(&mut self.get_mut().inner).poll(cx)
    }
}
