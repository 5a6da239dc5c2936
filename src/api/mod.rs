//! API Module
//!
//! This module exposes the graph query API over HTTP as a JSON-RPC endpoint.

mod server;

pub use server::Server;
