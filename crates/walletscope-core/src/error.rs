use bitcoin::Txid;

use crate::accounts::AccountLabel;

// ==============================================================================
// RPC and Core Errors
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server error {code}: {message}")]
    ServerError { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("RPC communication failure: {0}")]
    Rpc(#[from] RpcError),

    #[error("transaction not found: {0}")]
    TxNotFound(Txid),

    #[error("invalid transaction data: {0}")]
    InvalidTxData(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ==============================================================================
// Aggregation Errors
// ==============================================================================

/// A wallet backend that could not be queried during collection.
///
/// Never fatal on its own: the backend contributes no summaries and the
/// request continues with the remaining accounts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("wallet backend `{account}` unreachable: {reason}")]
pub struct BackendUnreachable {
    pub account: AccountLabel,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("unknown account selector `{0}`")]
    InvalidAccountSelector(String),

    #[error("none of the {attempted} wallet backend(s) could be reached")]
    AllBackendsUnreachable { attempted: usize },

    #[error("node could not resolve transaction {txid}: {reason}")]
    TransactionResolutionFailed { txid: Txid, reason: String },

    #[error("request cancelled")]
    Cancelled,
}
