use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use walletscope_core::AggregateError;

// ==============================================================================
// Error Type
// ==============================================================================

/// Handler error, rendered as a plain-text body.
#[derive(Debug)]
pub(crate) enum AppError {
    NotFound(String),
    Unprocessable(String),
    Internal(String),
    Unavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        (status, message).into_response()
    }
}

impl From<AggregateError> for AppError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::InvalidAccountSelector(_) => Self::Unprocessable(err.to_string()),
            AggregateError::AllBackendsUnreachable { .. } | AggregateError::Cancelled => {
                Self::Unavailable(err.to_string())
            }
            // The reason carries raw transport detail; log it, don't echo it.
            AggregateError::TransactionResolutionFailed { txid, reason } => {
                tracing::error!(%txid, %reason, "transaction resolution failed");
                Self::Internal(format!("could not resolve transaction {txid}"))
            }
        }
    }
}
