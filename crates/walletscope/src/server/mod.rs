mod error;
mod tx;

use std::sync::Arc;

use axum::http::{Method, Uri};
use axum::routing::get;
use axum::{Json, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use walletscope_core::accounts::{selectors, AccountLabel};
use walletscope_core::rpc::NodeRpc;
use walletscope_core::{AggregateOptions, BackendRegistry};

// ==============================================================================
// Application State
// ==============================================================================

pub struct AppState {
    pub registry: BackendRegistry,
    pub node: Arc<dyn NodeRpc>,
    pub options: AggregateOptions,
    /// Cancelled on server shutdown; every request derives a child token.
    pub shutdown: CancellationToken,
}

type SharedState = Arc<AppState>;

// ==============================================================================
// Router
// ==============================================================================

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD]);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/tx/{account}", get(tx::get_transactions))
        .route("/tx/{account}/", get(tx::get_transactions))
        .fallback(not_found)
        .layer(cors)
        .with_state(Arc::new(state))
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "accounts": AccountLabel::ALL.map(AccountLabel::as_str),
        "selectors": selectors().collect::<Vec<_>>(),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn not_found(uri: Uri) -> error::AppError {
    error::AppError::NotFound(format!("{uri} does not seem to exist! (404)"))
}
