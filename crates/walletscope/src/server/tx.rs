use axum::extract::{Path, State};
use axum::Json;

use walletscope_core::{aggregate, resolve, AggregatedTransaction};

use super::error::AppError;
use super::SharedState;

// ==============================================================================
// Handler
// ==============================================================================

pub(super) async fn get_transactions(
    State(state): State<SharedState>,
    Path(selector): Path<String>,
) -> Result<Json<Vec<AggregatedTransaction>>, AppError> {
    let backends = resolve(&selector, &state.registry)?;

    // Dropping this handler's future (client gone) cancels the token too.
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let aggregation = aggregate(&backends, state.node.as_ref(), &state.options, &cancel).await?;

    tracing::info!(
        selector = %selector,
        transactions = aggregation.transactions.len(),
        omitted_accounts = aggregation.unreachable.len(),
        "served transaction history"
    );

    Ok(Json(aggregation.transactions))
}
