//! Query Engine Module
//!
//! This module plays the embedding-engine role around the batching cache:
//! it constructs one fresh loader scope per logical query, registers every
//! load for a resolution level, closes the scheduling window, and only then
//! awaits the thunks.

mod resolver;

pub use resolver::QueryResolver;
