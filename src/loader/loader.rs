//! Loader Module
//!
//! This module implements the scope object of the batching cache. One
//! `Loader` is constructed per logical request and owns three pieces of
//! state: the scope cache (key -> settled-or-pending future), the currently
//! open batch, and the cancelled flag.
//!
//! # Lifecycle
//! 1. The embedding engine constructs a fresh `Loader` for the request
//! 2. Resolvers call `load` / `load_many`, which register keys and return thunks
//! 3. The engine closes the scheduling window with `flush`, dispatching one
//!    coalesced fetch and distributing the results
//! 4. The engine awaits the thunks; repeat from 2 for the next resolution level
//! 5. Dropping the loader (or calling `cancel`) settles anything still queued
//!    with `Cancelled`

use crate::loader::batch::Batch;
use crate::loader::{BatchFn, LoadError, LoadFuture};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Mutable state of one execution scope
///
/// Guarded by a synchronous mutex: every critical section is a plain map or
/// vector mutation and none of them crosses an await point, so holding an
/// async lock here would buy nothing.
struct ScopeState<K, V: Clone + 'static> {
    /// Key -> future handed to every caller of that key within this scope
    cache: HashMap<K, LoadFuture<V>>,
    /// Batch accumulating keys for the currently open scheduling window
    open: Batch<K, V>,
    /// Set once by `cancel`; later loads settle immediately with `Cancelled`
    cancelled: bool,
}

/// Request-scoped batching cache
///
/// Collects identifier lookups issued during one query execution window,
/// deduplicates and batches them into a single call to the injected
/// [`BatchFn`], and distributes results back to each original caller.
///
/// The loader is the scope: construct one per logical request and never
/// share it across unrelated requests. It is safe to share across the
/// concurrent resolution steps *of* that request (behind an `Arc`).
pub struct Loader<K, V: Clone + 'static> {
    fetcher: Arc<dyn BatchFn<K, V>>,
    state: Mutex<ScopeState<K, V>>,
}

impl<K, V> Loader<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new loader scope around a batch fetcher
    ///
    /// # Arguments
    /// * `fetcher` - The injected batch fetcher; may be shared across scopes
    pub fn new(fetcher: Arc<dyn BatchFn<K, V>>) -> Self {
        Self {
            fetcher,
            state: Mutex::new(ScopeState {
                cache: HashMap::new(),
                open: Batch::new(),
                cancelled: false,
            }),
        }
    }

    /// Register interest in a key and return its thunk
    ///
    /// Never blocks and never suspends. If the key is already known to this
    /// scope (pending or settled), returns a clone of its stored future.
    /// Otherwise creates a pending request, appends the key to the open
    /// batch, caches the future, and returns it.
    ///
    /// The returned future settles from the dispatch step, never from `load`
    /// itself: callers must let the engine `flush` the window before
    /// awaiting, or the batch degenerates to a single key.
    pub fn load(&self, key: K) -> LoadFuture<V> {
        let mut state = self.state();

        if state.cancelled {
            return LoadFuture::settled(Err(LoadError::Cancelled));
        }

        if let Some(existing) = state.cache.get(&key) {
            return existing.clone();
        }

        let (tx, rx) = oneshot::channel();
        let future = LoadFuture::pending(rx);
        state.cache.insert(key.clone(), future.clone());
        state.open.push(key, tx);
        future
    }

    /// Register interest in several keys, preserving input order
    ///
    /// Convenience form of repeated [`Loader::load`]; the returned thunks are
    /// positionally aligned with the input keys.
    pub fn load_many(&self, keys: impl IntoIterator<Item = K>) -> Vec<LoadFuture<V>> {
        keys.into_iter().map(|key| self.load(key)).collect()
    }

    /// Number of keys queued in the currently open window
    ///
    /// Useful for engines that trigger a flush once a level's loads are all
    /// registered, and for tests.
    pub fn pending(&self) -> usize {
        self.state().open.len()
    }

    /// Close the scheduling window and dispatch the accumulated batch
    ///
    /// Takes the open batch (leaving a fresh empty window for subsequent
    /// loads), invokes the fetcher exactly once with the deduplicated
    /// first-seen-ordered key list, and distributes results positionally.
    /// A window with zero accumulated keys performs no fetch.
    ///
    /// If the fetcher returns a result list whose length differs from the
    /// key list, every pending request in the batch settles with
    /// [`LoadError::ContractViolation`]; no partial results are delivered.
    pub async fn flush(&self) {
        // Take the batch under the lock, then fetch with the lock released:
        // loads issued while the fetch is in flight land in the next window
        let batch = {
            let mut state = self.state();
            if state.open.is_empty() {
                return;
            }
            std::mem::replace(&mut state.open, Batch::new())
        };

        let keys = batch.keys();
        debug!("Dispatching batch with {} distinct keys", keys.len());

        let results = self.fetcher.fetch(&keys).await;

        if results.len() != keys.len() {
            warn!(
                "Fetcher contract violation: {} results for {} keys",
                results.len(),
                keys.len()
            );
            batch.settle_all(LoadError::ContractViolation {
                expected: keys.len(),
                got: results.len(),
            });
            return;
        }

        batch.distribute(results);
    }

    /// Cancel the scope
    ///
    /// Every key queued in the open window settles with
    /// [`LoadError::Cancelled`] and the fetcher is not invoked for it; loads
    /// issued after cancellation settle the same way immediately. A flush
    /// already dispatched keeps running to completion (the fetch is in
    /// flight and its distribution is irrevocable).
    pub fn cancel(&self) {
        let batch = {
            let mut state = self.state();
            state.cancelled = true;
            std::mem::replace(&mut state.open, Batch::new())
        };

        if !batch.is_empty() {
            debug!("Scope cancelled with {} keys queued", batch.len());
        }
        batch.settle_all(LoadError::Cancelled);
    }

    /// Acquire the scope state lock
    ///
    /// A poisoned lock only means another caller panicked mid-mutation of a
    /// plain collection; the state itself is still usable, so the poison is
    /// collapsed instead of propagated.
    fn state(&self) -> MutexGuard<'_, ScopeState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
