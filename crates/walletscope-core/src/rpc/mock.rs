use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, Txid};

use crate::error::{CoreError, RpcError};
use crate::types::{CanonicalTransaction, TransactionSummary};

use super::types::ChainInfo;
use super::{NodeRpc, WalletRpc};

// ==============================================================================
// Mock Wallet
// ==============================================================================

/// A mock wallet backend for testing. Returns a canned `listtransactions`
/// answer, optionally after a delay, or fails every call.
pub struct MockWallet {
    summaries: Vec<TransactionSummary>,
    unreachable: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockWallet {
    pub fn builder() -> MockWalletBuilder {
        MockWalletBuilder {
            summaries: Vec::new(),
            unreachable: false,
            delay: None,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub struct MockWalletBuilder {
    summaries: Vec<TransactionSummary>,
    unreachable: bool,
    delay: Option<Duration>,
}

impl MockWalletBuilder {
    pub fn with_summary(mut self, summary: TransactionSummary) -> Self {
        self.summaries.push(summary);
        self
    }

    pub fn with_summaries(mut self, summaries: impl IntoIterator<Item = TransactionSummary>) -> Self {
        self.summaries.extend(summaries);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn build(self) -> MockWallet {
        MockWallet {
            summaries: self.summaries,
            unreachable: self.unreachable,
            delay: self.delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WalletRpc for MockWallet {
    async fn list_account_transactions(
        &self,
        _account: &str,
        limit: usize,
    ) -> Result<Vec<TransactionSummary>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable {
            return Err(CoreError::Rpc(RpcError::InvalidResponse(
                "connection refused".into(),
            )));
        }
        Ok(self.summaries.iter().take(limit).cloned().collect())
    }
}

// ==============================================================================
// Mock Node
// ==============================================================================

/// A mock full node for testing. Returns canned transactions from a
/// `HashMap` populated via the builder pattern.
pub struct MockNode {
    transactions: HashMap<Txid, CanonicalTransaction>,
    failing: HashSet<Txid>,
    delays: HashMap<Txid, Duration>,
    chain_info: ChainInfo,
    lookups: AtomicUsize,
}

impl MockNode {
    pub fn builder() -> MockNodeBuilder {
        MockNodeBuilder {
            transactions: HashMap::new(),
            failing: HashSet::new(),
            delays: HashMap::new(),
            chain_info: ChainInfo {
                chain: "regtest".into(),
                blocks: 100,
                best_block_hash: BlockHash::all_zeros(),
                pruned: false,
            },
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

pub struct MockNodeBuilder {
    transactions: HashMap<Txid, CanonicalTransaction>,
    failing: HashSet<Txid>,
    delays: HashMap<Txid, Duration>,
    chain_info: ChainInfo,
}

impl MockNodeBuilder {
    pub fn with_tx(mut self, tx: CanonicalTransaction) -> Self {
        self.transactions.insert(tx.txid, tx);
        self
    }

    /// Answer lookups of `txid` with `tx`, whatever txid `tx` carries.
    pub fn with_tx_for(mut self, txid: Txid, tx: CanonicalTransaction) -> Self {
        self.transactions.insert(txid, tx);
        self
    }

    /// Make lookups of `txid` fail with an RPC error.
    pub fn failing(mut self, txid: Txid) -> Self {
        self.failing.insert(txid);
        self
    }

    /// Delay the answer for `txid`.
    pub fn with_delay(mut self, txid: Txid, delay: Duration) -> Self {
        self.delays.insert(txid, delay);
        self
    }

    pub fn build(self) -> MockNode {
        MockNode {
            transactions: self.transactions,
            failing: self.failing,
            delays: self.delays,
            chain_info: self.chain_info,
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl NodeRpc for MockNode {
    async fn get_canonical_transaction(
        &self,
        txid: &Txid,
    ) -> Result<CanonicalTransaction, CoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(txid) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(txid) {
            return Err(CoreError::Rpc(RpcError::ServerError {
                code: -32603,
                message: "internal error".into(),
            }));
        }
        self.transactions
            .get(txid)
            .cloned()
            .ok_or(CoreError::TxNotFound(*txid))
    }

    async fn get_chain_info(&self) -> Result<ChainInfo, CoreError> {
        Ok(self.chain_info.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[tokio::test]
    async fn wallet_honours_limit() {
        let wallet = MockWallet::builder()
            .with_summaries((1..=5).map(|b| make_summary(txid_from_byte(b), "receive", 100)))
            .build();
        let listed = wallet
            .list_account_transactions("*", 3)
            .await
            .expect("mock wallet must answer");
        assert_eq!(listed.len(), 3);
        assert_eq!(wallet.calls(), 1);
    }

    #[tokio::test]
    async fn node_reports_missing_tx_as_not_found() {
        let node = MockNode::builder().build();
        let txid = txid_from_byte(9);
        let err = node
            .get_canonical_transaction(&txid)
            .await
            .expect_err("unknown txid must fail");
        assert!(matches!(err, CoreError::TxNotFound(found) if found == txid));
    }
}
