//! Fan-out, deduplication, and enrichment of wallet transaction history.
//!
//! A request moves through three stages:
//!
//! 1. **Collect**: every selected wallet backend is asked for its
//!    transactions concurrently. A backend that errors or times out is
//!    recorded as unreachable and contributes nothing.
//! 2. **Deduplicate**: summaries are collapsed by txid, first occurrence in
//!    canonical account order wins.
//! 3. **Enrich**: each distinct txid is resolved against the full node. Any
//!    failure here fails the whole request, since the node is the source of
//!    truth for what the wallets report.

use std::collections::HashMap;
use std::time::Duration;

use bitcoin::Txid;
use futures::future::{join_all, try_join_all};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::accounts::{AccountLabel, WalletBackend};
use crate::error::{AggregateError, BackendUnreachable};
use crate::rpc::{NodeRpc, ANY_ACCOUNT};
use crate::types::{
    AggregatedTransaction, Aggregation, CanonicalTransaction, TransactionSummary, WalletContext,
};

/// Per-account `listtransactions` count used when nothing else is configured.
/// Large enough to cover a wallet's full history in practice.
pub const DEFAULT_PER_ACCOUNT_LIMIT: usize = 999_999;

// ==============================================================================
// Options
// ==============================================================================

/// Tunables applied uniformly to every aggregation request.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Maximum number of summaries requested from each backend.
    pub per_account_limit: usize,
    /// Deadline for a single backend's `listtransactions` call.
    pub backend_timeout: Duration,
    /// Deadline for a single node lookup.
    pub node_timeout: Duration,
    /// Maximum node lookups in flight at once.
    pub enrich_concurrency: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            per_account_limit: DEFAULT_PER_ACCOUNT_LIMIT,
            backend_timeout: Duration::from_secs(30),
            node_timeout: Duration::from_secs(30),
            enrich_concurrency: 4,
        }
    }
}

// ==============================================================================
// Aggregation Entry Point
// ==============================================================================

/// Run the collect/dedup/enrich pipeline over `backends`.
///
/// `backends` must already be in canonical order (as returned by
/// [`crate::accounts::resolve`]); output order depends on it. Cancelling
/// `cancel` abandons every in-flight backend and node call and yields
/// [`AggregateError::Cancelled`].
pub async fn aggregate(
    backends: &[&WalletBackend],
    node: &dyn NodeRpc,
    options: &AggregateOptions,
    cancel: &CancellationToken,
) -> Result<Aggregation, AggregateError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(backends = backends.len(), "aggregation cancelled");
            Err(AggregateError::Cancelled)
        }
        result = run_pipeline(backends, node, options) => result,
    }
}

async fn run_pipeline(
    backends: &[&WalletBackend],
    node: &dyn NodeRpc,
    options: &AggregateOptions,
) -> Result<Aggregation, AggregateError> {
    if backends.is_empty() {
        return Ok(Aggregation::default());
    }

    let collected = collect(backends, options).await?;
    let collected_count = collected.entries.len();

    let candidates = deduplicate(collected.entries);
    debug!(
        collected = collected_count,
        distinct = candidates.len(),
        "deduplicated wallet summaries"
    );

    let transactions = enrich(candidates, node, options).await?;

    info!(
        backends = backends.len(),
        unreachable = collected.unreachable.len(),
        transactions = transactions.len(),
        "aggregation complete"
    );

    Ok(Aggregation {
        transactions,
        unreachable: collected.unreachable,
    })
}

// ==============================================================================
// Stage A: Collection
// ==============================================================================

struct Collected {
    /// Summaries in backend order, each backend's own order preserved.
    entries: Vec<(AccountLabel, TransactionSummary)>,
    unreachable: Vec<BackendUnreachable>,
}

async fn collect(
    backends: &[&WalletBackend],
    options: &AggregateOptions,
) -> Result<Collected, AggregateError> {
    // Each backend fills its own buffer; results are merged in input order
    // once every query has returned or timed out.
    let results = join_all(
        backends
            .iter()
            .map(|backend| query_backend(backend, options)),
    )
    .await;

    let mut entries = Vec::new();
    let mut unreachable = Vec::new();
    for (backend, result) in backends.iter().zip(results) {
        match result {
            Ok(summaries) => {
                debug!(
                    account = %backend.account,
                    summaries = summaries.len(),
                    "collected wallet summaries"
                );
                entries.extend(summaries.into_iter().map(|s| (backend.account, s)));
            }
            Err(failure) => {
                warn!(
                    account = %failure.account,
                    reason = %failure.reason,
                    "wallet backend unreachable; skipping its transactions"
                );
                unreachable.push(failure);
            }
        }
    }

    if unreachable.len() == backends.len() {
        return Err(AggregateError::AllBackendsUnreachable {
            attempted: backends.len(),
        });
    }

    Ok(Collected {
        entries,
        unreachable,
    })
}

async fn query_backend(
    backend: &WalletBackend,
    options: &AggregateOptions,
) -> Result<Vec<TransactionSummary>, BackendUnreachable> {
    let call = backend
        .rpc
        .list_account_transactions(ANY_ACCOUNT, options.per_account_limit);

    match tokio::time::timeout(options.backend_timeout, call).await {
        Ok(Ok(summaries)) => Ok(summaries),
        Ok(Err(err)) => Err(BackendUnreachable {
            account: backend.account,
            reason: err.to_string(),
        }),
        Err(_) => Err(BackendUnreachable {
            account: backend.account,
            reason: format!("no answer within {:?}", options.backend_timeout),
        }),
    }
}

// ==============================================================================
// Stage B: Deduplication
// ==============================================================================

/// Collapse summaries by txid, keeping the first occurrence.
///
/// Later occurrences only extend the kept entry's `seen_in` list. Their
/// fields are never merged into the kept summary.
pub(crate) fn deduplicate(entries: Vec<(AccountLabel, TransactionSummary)>) -> Vec<WalletContext> {
    let mut kept: Vec<WalletContext> = Vec::new();
    let mut index: HashMap<Txid, usize> = HashMap::new();

    for (account, summary) in entries {
        match index.get(&summary.txid) {
            Some(&position) => {
                let existing = &mut kept[position];
                if existing.seen_in.contains(&account) {
                    continue;
                }
                if summary.category != existing.summary.category
                    || summary.amount != existing.summary.amount
                {
                    if is_transfer_mirror(&existing.summary, &summary) {
                        debug!(
                            txid = %summary.txid,
                            kept_account = %existing.account,
                            dropped_account = %account,
                            "transfer between accounts; keeping first summary"
                        );
                    } else {
                        info!(
                            txid = %summary.txid,
                            kept_account = %existing.account,
                            kept_category = %existing.summary.category,
                            kept_amount = %existing.summary.amount,
                            dropped_account = %account,
                            dropped_category = %summary.category,
                            dropped_amount = %summary.amount,
                            "accounts disagree on a shared transaction; keeping first summary"
                        );
                    }
                }
                existing.seen_in.push(account);
            }
            None => {
                index.insert(summary.txid, kept.len());
                kept.push(WalletContext {
                    account,
                    summary,
                    seen_in: vec![account],
                });
            }
        }
    }

    kept
}

/// A send seen by one account and the matching receive seen by another.
fn is_transfer_mirror(a: &TransactionSummary, b: &TransactionSummary) -> bool {
    let opposite = matches!(
        (a.category.as_str(), b.category.as_str()),
        ("send", "receive") | ("receive", "send")
    );
    opposite && a.amount.to_sat().checked_neg() == Some(b.amount.to_sat())
}

// ==============================================================================
// Stage C: Enrichment
// ==============================================================================

async fn enrich(
    candidates: Vec<WalletContext>,
    node: &dyn NodeRpc,
    options: &AggregateOptions,
) -> Result<Vec<AggregatedTransaction>, AggregateError> {
    let semaphore = Semaphore::new(options.enrich_concurrency.max(1));

    // `try_join_all` keeps input order and drops the remaining lookups as
    // soon as one fails.
    let lookups = candidates.into_iter().map(|wallet| {
        let semaphore = &semaphore;
        async move {
            let transaction =
                resolve_canonical(node, semaphore, wallet.summary.txid, options.node_timeout)
                    .await?;
            Ok::<_, AggregateError>(AggregatedTransaction {
                transaction,
                wallet,
            })
        }
    });

    try_join_all(lookups).await
}

async fn resolve_canonical(
    node: &dyn NodeRpc,
    semaphore: &Semaphore,
    txid: Txid,
    timeout: Duration,
) -> Result<CanonicalTransaction, AggregateError> {
    let _permit = semaphore
        .acquire()
        .await
        .expect("semaphore is never closed");

    let failed = |reason: String| {
        warn!(%txid, %reason, "node could not resolve wallet-reported transaction");
        AggregateError::TransactionResolutionFailed { txid, reason }
    };

    let transaction = match tokio::time::timeout(timeout, node.get_canonical_transaction(&txid))
        .await
    {
        Ok(Ok(transaction)) => transaction,
        Ok(Err(err)) => return Err(failed(err.to_string())),
        Err(_) => return Err(failed(format!("no answer within {timeout:?}"))),
    };

    if transaction.txid != txid {
        return Err(failed(format!(
            "node answered with transaction {}",
            transaction.txid
        )));
    }

    Ok(transaction)
}
