//! Shared test helpers for `walletscope-core` unit tests.
//!
//! Builders for wallet summaries and canonical transactions so that tests
//! across modules share a single source of truth for dummy data.

use bitcoin::hashes::Hash;
use bitcoin::{Amount, OutPoint, ScriptBuf, SignedAmount, Txid};

use crate::types::{
    BlockHeight, CanonicalInput, CanonicalOutput, CanonicalTransaction, TransactionSummary,
};

// ==============================================================================
// Txid Helpers
// ==============================================================================

/// Create a deterministic `Txid` from a single distinguishing byte.
pub fn txid_from_byte(b: u8) -> Txid {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    Txid::from_byte_array(bytes)
}

/// Parse a 64-character hex txid.
pub fn txid(hex: &str) -> Txid {
    hex.parse().expect("test txid hex must parse")
}

// ==============================================================================
// Builders
// ==============================================================================

/// A wallet summary with the given category and amount in atoms.
pub fn make_summary(txid: Txid, category: &str, atoms: i64) -> TransactionSummary {
    TransactionSummary {
        txid,
        account: Some("default".into()),
        address: None,
        category: category.into(),
        amount: SignedAmount::from_sat(atoms),
        fee: None,
        vout: Some(0),
        confirmations: Some(6),
        time: Some(1_530_000_000),
    }
}

/// A confirmed canonical transaction with one spending input and one output.
pub fn make_canonical_tx(txid: Txid) -> CanonicalTransaction {
    CanonicalTransaction {
        txid,
        hex: format!("01000000{}", txid),
        version: 1,
        locktime: 0,
        expiry: Some(0),
        block_hash: None,
        block_height: Some(BlockHeight(250_000)),
        confirmations: Some(6),
        time: Some(1_530_000_000),
        block_time: Some(1_530_000_000),
        inputs: vec![CanonicalInput {
            prevout: Some(OutPoint::new(Txid::all_zeros(), 0)),
            sequence: 0xFFFF_FFFF,
            value: Some(Amount::from_sat(10_000)),
        }],
        outputs: vec![CanonicalOutput {
            n: 0,
            value: Amount::from_sat(9_000),
            script_pub_key: ScriptBuf::new(),
            script_type: Some("pubkeyhash".into()),
            addresses: vec!["DsExampleAddress".into()],
        }],
    }
}
