use async_trait::async_trait;

/// Outcome of fetching one key: the value, or an opaque failure reason.
///
/// Absence is not a failure: a data source that finds nothing for a key
/// returns a value representing "no result" (e.g., an empty list).
pub type FetchResult<V> = Result<V, String>;

/// Batch fetcher supplied by the embedding application
///
/// The loader invokes `fetch` at most once per scheduling window, passing the
/// deduplicated keys in first-seen order. The returned list must contain
/// exactly one result per input key, in the same order; a length mismatch is
/// treated as a contract violation and fails every waiter in the batch.
///
/// Implementations must not call back into the same scope's `Loader` in a
/// way that re-enters keys already being resolved.
#[async_trait]
pub trait BatchFn<K, V>: Send + Sync {
    /// Fetch values for an ordered list of distinct keys
    ///
    /// # Arguments
    /// * `keys` - Deduplicated keys in first-seen order
    ///
    /// # Returns
    /// One `FetchResult` per key, positionally aligned with `keys`
    async fn fetch(&self, keys: &[K]) -> Vec<FetchResult<V>>
    where
        K: 'async_trait,
        V: 'async_trait;
}
