use crate::loader::{FetchResult, LoadError};
use tokio::sync::oneshot;

/// One key waiting for resolution
///
/// Created when a caller loads a key that is not yet in the scope cache.
/// Holds the sending half of the channel backing that key's `LoadFuture`;
/// fan-out to multiple callers happens by cloning the future, so each
/// distinct key has exactly one pending request.
pub(crate) struct PendingRequest<K, V> {
    pub(crate) key: K,
    pub(crate) tx: oneshot::Sender<Result<V, LoadError>>,
}

/// Keys accumulated within one scheduling window
///
/// Deduplication is enforced upstream: the loader only appends a key here
/// when it was absent from the scope cache, so within one batch each
/// distinct key appears at most once, in first-seen order.
pub(crate) struct Batch<K, V> {
    requests: Vec<PendingRequest<K, V>>,
}

impl<K, V> Batch<K, V>
where
    K: Clone,
{
    /// Creates a new empty batch (a freshly opened window)
    pub(crate) fn new() -> Self {
        Self {
            requests: Vec::new(),
        }
    }

    /// Append a pending request for a key not yet in this window
    pub(crate) fn push(&mut self, key: K, tx: oneshot::Sender<Result<V, LoadError>>) {
        self.requests.push(PendingRequest { key, tx });
    }

    /// Number of distinct keys queued in this window
    pub(crate) fn len(&self) -> usize {
        self.requests.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// The key list to hand to the fetcher, in first-seen order
    pub(crate) fn keys(&self) -> Vec<K> {
        self.requests.iter().map(|req| req.key.clone()).collect()
    }

    /// Settle every pending request in this batch with the same error
    ///
    /// Used for cancellation (window drained without dispatch) and for
    /// contract violations (fetcher returned a misaligned result list).
    pub(crate) fn settle_all(self, err: LoadError) {
        for req in self.requests {
            // A closed receiver means every clone of the future was dropped;
            // nothing is waiting, so the lost send is fine
            let _ = req.tx.send(Err(err.clone()));
        }
    }

    /// Distribute fetch results positionally to the pending requests
    ///
    /// The caller has already verified that `results` has the same length as
    /// the dispatched key list. A per-key error settles only that key's
    /// request; other keys in the batch are unaffected.
    pub(crate) fn distribute(self, results: Vec<FetchResult<V>>) {
        for (req, result) in self.requests.into_iter().zip(results) {
            let _ = req.tx.send(result.map_err(LoadError::Fetch));
        }
    }
}
