//! Batching Resolution Cache Module
//!
//! This module implements a request-scoped batching cache for identifier
//! lookups. Resolvers running within one logical request register interest in
//! keys without triggering individual fetches; the keys accumulate in an open
//! batch until the embedding engine closes the scheduling window with
//! `flush()`, at which point one coalesced call goes to the batch fetcher and
//! the results fan back out to every waiting caller.
//!
//! # Components
//! - `BatchFn`: injected fetcher mapping an ordered key list to one result per key
//! - `Batch`: deduplicated keys accumulated within one scheduling window
//! - `LoadFuture`: cloneable thunk handed to each caller, settled exactly once
//! - `Loader`: the scope object tying cache, open batch, and cancellation together
//!
//! # Important Rule
//! Callers must NOT block on a returned future before the window is flushed.
//! The engine driving the query issues every `load` for one resolution level
//! first, then calls `flush()`, then awaits the thunks. Awaiting each load
//! immediately after issuing it collapses every batch to a single key.

mod batch;
mod batch_fn;
mod future;
mod loader;

#[cfg(test)]
mod tests;

pub use batch_fn::{BatchFn, FetchResult};
pub use future::LoadFuture;
pub use loader::Loader;

use thiserror::Error;

/// Errors delivered to waiters of a `LoadFuture`
///
/// Per-key fetch failures stay local to that key's waiters; a contract
/// violation settles every pending request in the offending batch; a
/// cancelled scope settles everything still queued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The fetcher reported a failure for this specific key
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The fetcher returned a result list whose length does not match the
    /// dispatched key list (fatal for the whole batch)
    #[error("fetcher returned {got} results for {expected} keys")]
    ContractViolation { expected: usize, got: usize },

    /// The execution scope ended before this key's value was delivered
    #[error("execution scope cancelled before the value was delivered")]
    Cancelled,
}
