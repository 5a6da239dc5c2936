//! Tests for the batching resolution cache
//!
//! Verifies the window/dispatch contract: deduplication, first-seen dispatch
//! order, positional distribution, per-key error isolation, contract
//! violations, and cancellation.

#[cfg(test)]
mod tests {
    use crate::loader::{BatchFn, FetchResult, LoadError, Loader};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Recording fetcher used by every test
    ///
    /// Resolves key `k` to `"value-k"`, records each dispatched key list,
    /// and can be configured to fail specific keys or to violate the
    /// length contract by truncating its result list.
    struct MockFetcher {
        calls: Mutex<Vec<Vec<u64>>>,
        fail_keys: HashSet<u64>,
        truncate: bool,
    }

    impl MockFetcher {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_keys: HashSet::new(),
                truncate: false,
            }
        }

        fn failing(keys: &[u64]) -> Self {
            Self {
                fail_keys: keys.iter().copied().collect(),
                ..Self::new()
            }
        }

        fn truncating() -> Self {
            Self {
                truncate: true,
                ..Self::new()
            }
        }

        /// Key lists dispatched so far, in dispatch order
        fn calls(&self) -> Vec<Vec<u64>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BatchFn<u64, String> for MockFetcher {
        async fn fetch(&self, keys: &[u64]) -> Vec<FetchResult<String>> {
            self.calls.lock().unwrap().push(keys.to_vec());

            let mut results: Vec<FetchResult<String>> = keys
                .iter()
                .map(|key| {
                    if self.fail_keys.contains(key) {
                        Err(format!("no value for key {}", key))
                    } else {
                        Ok(format!("value-{}", key))
                    }
                })
                .collect();

            if self.truncate {
                results.pop();
            }
            results
        }
    }

    /// Helper to build a loader scope over a mock fetcher
    fn scope(fetcher: MockFetcher) -> (Arc<MockFetcher>, Loader<u64, String>) {
        let fetcher = Arc::new(fetcher);
        let loader = Loader::new(fetcher.clone() as Arc<dyn BatchFn<u64, String>>);
        (fetcher, loader)
    }

    #[tokio::test]
    async fn test_overlapping_loads_coalesce_into_one_fetch() {
        let (fetcher, loader) = scope(MockFetcher::new());

        // Keys [1, 2, 1, 3] requested before the window closes
        let first_one = loader.load(1);
        let two = loader.load(2);
        let second_one = loader.load(1);
        let three = loader.load(3);

        // The duplicate key occupies no extra slot in the window
        assert_eq!(loader.pending(), 3);

        loader.flush().await;

        // Exactly one dispatch, deduplicated, first-seen order
        assert_eq!(fetcher.calls(), vec![vec![1, 2, 3]]);

        // Both requests for key 1 resolve to the same value
        assert_eq!(first_one.await, Ok("value-1".to_string()));
        assert_eq!(second_one.await, Ok("value-1".to_string()));
        assert_eq!(two.await, Ok("value-2".to_string()));
        assert_eq!(three.await, Ok("value-3".to_string()));
    }

    #[tokio::test]
    async fn test_repeat_load_after_settlement_is_a_cache_hit() {
        let (fetcher, loader) = scope(MockFetcher::new());

        let first = loader.load(7);
        loader.flush().await;
        assert_eq!(first.await, Ok("value-7".to_string()));

        // The repeat load settles from the scope cache without opening a
        // window: no flush needed, no second fetch
        let repeat = loader.load(7);
        assert_eq!(loader.pending(), 0);
        assert_eq!(repeat.await, Ok("value-7".to_string()));
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_order_is_first_seen_order() {
        let (fetcher, loader) = scope(MockFetcher::new());

        for key in [5, 3, 9, 3, 5] {
            let _thunk = loader.load(key);
        }
        loader.flush().await;

        assert_eq!(fetcher.calls(), vec![vec![5, 3, 9]]);
    }

    #[tokio::test]
    async fn test_load_many_preserves_input_order() {
        let (_fetcher, loader) = scope(MockFetcher::new());

        let thunks = loader.load_many([4, 8, 6]);
        assert_eq!(thunks.len(), 3);
        loader.flush().await;

        let mut values = Vec::new();
        for thunk in thunks {
            values.push(thunk.await.unwrap());
        }
        assert_eq!(values, vec!["value-4", "value-8", "value-6"]);
    }

    #[tokio::test]
    async fn test_length_mismatch_fails_the_whole_batch() {
        let (fetcher, loader) = scope(MockFetcher::truncating());

        let one = loader.load(1);
        let two = loader.load(2);
        loader.flush().await;

        // One fetch happened, but both waiters see the violation; the
        // surviving result is never partially delivered
        assert_eq!(fetcher.calls().len(), 1);
        let expected = Err(LoadError::ContractViolation {
            expected: 2,
            got: 1,
        });
        assert_eq!(one.await, expected);
        assert_eq!(two.await, expected);
    }

    #[tokio::test]
    async fn test_per_key_error_stays_local_to_that_key() {
        let (_fetcher, loader) = scope(MockFetcher::failing(&[2]));

        let one = loader.load(1);
        let two = loader.load(2);
        let three = loader.load(3);
        loader.flush().await;

        assert_eq!(one.await, Ok("value-1".to_string()));
        assert_eq!(two.await, Err(LoadError::Fetch("no value for key 2".to_string())));
        assert_eq!(three.await, Ok("value-3".to_string()));
    }

    #[tokio::test]
    async fn test_empty_window_performs_no_fetch() {
        let (fetcher, loader) = scope(MockFetcher::new());

        loader.flush().await;

        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_before_dispatch_settles_everything_cancelled() {
        let (fetcher, loader) = scope(MockFetcher::new());

        let one = loader.load(1);
        let two = loader.load(2);
        let three = loader.load(3);

        loader.cancel();

        assert_eq!(one.await, Err(LoadError::Cancelled));
        assert_eq!(two.await, Err(LoadError::Cancelled));
        assert_eq!(three.await, Err(LoadError::Cancelled));

        // The fetcher was never invoked, and a later flush finds nothing
        loader.flush().await;
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_load_after_cancel_settles_cancelled_immediately() {
        let (fetcher, loader) = scope(MockFetcher::new());

        loader.cancel();
        let late = loader.load(42);

        assert_eq!(loader.pending(), 0);
        assert_eq!(late.await, Err(LoadError::Cancelled));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dropping_the_scope_cancels_outstanding_waiters() {
        let (fetcher, loader) = scope(MockFetcher::new());

        let orphan = loader.load(1);
        drop(loader);

        assert_eq!(orphan.await, Err(LoadError::Cancelled));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_steps_share_one_window() {
        let (fetcher, loader) = scope(MockFetcher::new());
        let loader = Arc::new(loader);

        // Three concurrent resolution steps register their keys, then all
        // parties meet at the barrier before the engine closes the window
        let barrier = Arc::new(tokio::sync::Barrier::new(4));
        let mut handles = Vec::new();
        for keys in [vec![1], vec![2, 1], vec![3]] {
            let loader = loader.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                let thunks = loader.load_many(keys);
                barrier.wait().await;
                let mut values = Vec::new();
                for thunk in thunks {
                    values.push(thunk.await.unwrap());
                }
                values
            }));
        }

        barrier.wait().await;
        loader.flush().await;

        let mut resolved = Vec::new();
        for handle in handles {
            resolved.extend(handle.await.unwrap());
        }
        resolved.sort();
        assert_eq!(resolved, vec!["value-1", "value-1", "value-2", "value-3"]);

        // All three steps were served by a single deduplicated dispatch
        let calls = fetcher.calls();
        assert_eq!(calls.len(), 1);
        let mut keys = calls[0].clone();
        keys.sort();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_loads_during_fetch_land_in_the_next_window() {
        let (fetcher, loader) = scope(MockFetcher::new());

        let first = loader.load(1);
        loader.flush().await;

        // The window closed with key 1; key 2 opens a fresh one
        let second = loader.load(2);
        assert_eq!(loader.pending(), 1);
        loader.flush().await;

        assert_eq!(first.await, Ok("value-1".to_string()));
        assert_eq!(second.await, Ok("value-2".to_string()));
        assert_eq!(fetcher.calls(), vec![vec![1], vec![2]]);
    }
}
