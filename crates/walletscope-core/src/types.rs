//! Domain types for wallet-reported and node-verified transactions.
//!
//! [`TransactionSummary`] is what a wallet says about a transaction,
//! [`CanonicalTransaction`] is what the full node says, and
//! [`AggregatedTransaction`] pairs the two for one aggregation result.

use bitcoin::{Amount, BlockHash, OutPoint, ScriptBuf, SignedAmount, Txid};
use serde::{Deserialize, Serialize};

use crate::accounts::AccountLabel;
use crate::error::BackendUnreachable;

// ==============================================================================
// Block Height
// ==============================================================================

/// A block height, wrapped for type safety.
///
/// `#[serde(transparent)]` keeps the JSON representation a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(pub u32);

impl From<u32> for BlockHeight {
    fn from(h: u32) -> Self {
        Self(h)
    }
}

impl std::ops::Deref for BlockHeight {
    type Target = u32;
    fn deref(&self) -> &u32 {
        &self.0
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ==============================================================================
// Wallet View
// ==============================================================================

/// One `listtransactions` entry as reported by a wallet.
///
/// Only `txid` is interpreted by the aggregator. Wallets may report the same
/// transaction several times (one entry per output and category), and two
/// wallets report the same transaction when it moves funds between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub txid: Txid,
    pub account: Option<String>,
    pub address: Option<String>,
    pub category: String,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub amount: SignedAmount,
    #[serde(default, with = "bitcoin::amount::serde::as_sat::opt")]
    pub fee: Option<SignedAmount>,
    pub vout: Option<u32>,
    pub confirmations: Option<i64>,
    /// Unix timestamp the wallet first saw the transaction.
    pub time: Option<i64>,
}

// ==============================================================================
// Node View
// ==============================================================================

/// The full node's authoritative record of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    pub txid: Txid,
    /// Serialized transaction exactly as returned by the node.
    pub hex: String,
    pub version: i32,
    pub locktime: u32,
    /// Expiry height; only reported by chains that have one.
    pub expiry: Option<u32>,
    pub block_hash: Option<BlockHash>,
    /// Block height; `None` for unconfirmed (mempool) transactions.
    pub block_height: Option<BlockHeight>,
    pub confirmations: Option<u64>,
    pub time: Option<i64>,
    pub block_time: Option<i64>,
    pub inputs: Vec<CanonicalInput>,
    pub outputs: Vec<CanonicalOutput>,
}

impl CanonicalTransaction {
    pub fn is_confirmed(&self) -> bool {
        self.confirmations.unwrap_or(0) > 0
    }
}

/// A transaction input. `prevout` is `None` for coinbase and stakebase inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalInput {
    pub prevout: Option<OutPoint>,
    pub sequence: u32,
    /// Value of the spent output when the node reports it (`amountin`).
    pub value: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalOutput {
    pub n: u32,
    pub value: Amount,
    pub script_pub_key: ScriptBuf,
    /// Script class as named by the node (e.g. `pubkeyhash`).
    pub script_type: Option<String>,
    pub addresses: Vec<String>,
}

// ==============================================================================
// Aggregation Result
// ==============================================================================

/// Wallet-side provenance kept for a deduplicated transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletContext {
    /// Account whose summary was retained (first in canonical order).
    pub account: AccountLabel,
    pub summary: TransactionSummary,
    /// Every account that reported the transaction, in canonical order.
    pub seen_in: Vec<AccountLabel>,
}

/// A canonical transaction together with the wallet context it was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedTransaction {
    #[serde(flatten)]
    pub transaction: CanonicalTransaction,
    pub wallet: WalletContext,
}

/// Output of one aggregation: unique by txid, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub transactions: Vec<AggregatedTransaction>,
    /// Backends whose contribution was dropped during collection.
    pub unreachable: Vec<BackendUnreachable>,
}

impl Aggregation {
    pub fn txids(&self) -> Vec<Txid> {
        self.transactions
            .iter()
            .map(|entry| entry.transaction.txid)
            .collect()
    }
}
