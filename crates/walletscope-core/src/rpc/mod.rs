//! Wallet and node RPC abstraction layer.
//!
//! Defines the [`WalletRpc`] and [`NodeRpc`] traits and provides an HTTP
//! JSON-RPC implementation ([`HttpRpcClient`]) of both, plus test mocks
//! (`mock::MockWallet`, `mock::MockNode`).

mod http_adapter;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use http_adapter::HttpRpcClient;
pub use types::ChainInfo;

use async_trait::async_trait;
use bitcoin::Txid;

use crate::error::CoreError;
use crate::types::{CanonicalTransaction, TransactionSummary};

/// Account pattern that makes `listtransactions` cover every account.
pub const ANY_ACCOUNT: &str = "*";

/// The wallet RPC method the aggregator needs.
///
/// One implementation instance talks to exactly one wallet endpoint.
#[async_trait]
pub trait WalletRpc: Send + Sync {
    /// List up to `limit` of the wallet's most recent transactions for
    /// `account` (`"*"` for all accounts).
    async fn list_account_transactions(
        &self,
        account: &str,
        limit: usize,
    ) -> Result<Vec<TransactionSummary>, CoreError>;
}

/// The full-node RPC methods the aggregator and startup checks need.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Fetch the node's verbose record of a transaction.
    async fn get_canonical_transaction(
        &self,
        txid: &Txid,
    ) -> Result<CanonicalTransaction, CoreError>;

    /// Fetch basic chain info (network, block count, best block).
    async fn get_chain_info(&self) -> Result<ChainInfo, CoreError>;
}
