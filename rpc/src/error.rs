//! API error type and its HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use custody_wallet_core::{ErrorCategory, WalletError};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("invalid seed phrase")]
    InvalidSeedPhrase,

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) | Self::InvalidSeedPhrase => StatusCode::BAD_REQUEST,
            Self::Wallet(err) => status_for(err.category()),
        }
    }
}

/// Status code for each error class.
pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Input | ErrorCategory::LedgerRejection => StatusCode::BAD_REQUEST,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Network => StatusCode::BAD_GATEWAY,
        ErrorCategory::Refused => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCategory::Decode | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(%status, error = %self, "request failed");
        }
        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
