//! Native JSON-RPC client for wallet and full-node endpoints.
//!
//! Implements [`super::WalletRpc`] and [`super::NodeRpc`] over JSON-RPC
//! using `reqwest`, with HTTP(S) transport, optional pinned TLS
//! certificates, basic auth, optional request rate limiting, and an LRU
//! block-height cache.

mod client;
mod connection;
mod parsing;
mod protocol;

pub use client::HttpRpcClient;
