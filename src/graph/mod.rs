//! Relationship Graph Module
//!
//! This module holds the in-memory data source backing the query API:
//! - GraphStore: users and their friend lists behind a shared handle
//! - FriendFetcher: the batch fetcher resolving friend lists through the store

mod fetcher;
mod store;

pub use fetcher::FriendFetcher;
pub use store::GraphStore;
