//! This crate serves a graph-shaped query API over HTTP, backed by an
//! in-memory relationship graph and a request-scoped batching cache that
//! coalesces repeated relationship lookups into single batched fetches.

pub mod types; // Defines common data structures used throughout the system.
pub mod loader; // Request-scoped batching cache (load, flush, cancel).
pub mod graph; // In-memory relationship graph and its batch fetcher.
pub mod query; // Query engine driving per-request loader scopes.
pub mod api; // HTTP JSON-RPC surface over the query engine.
pub mod config; // Defines and loads system configuration.

// Re-export commonly used types and configurations for easier access.
pub use types::*;
pub use config::Config;
pub use loader::{BatchFn, FetchResult, LoadError, LoadFuture, Loader};
