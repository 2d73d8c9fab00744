//! Request handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use custody_types::KeyPair;
use custody_utils::spans;
use custody_wallet_core::{Clock, Ledger, Wallet, WalletError};
use serde::{Deserialize, Serialize};
use tracing::{info, Instrument};

use crate::error::ApiError;

/// Shared state behind every route.
pub struct AppState<L> {
    pub wallet: Wallet<L>,
    pub clock: Arc<dyn Clock>,
}

// ── Login ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub seed_phrase: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub address: String,
}

pub async fn login<L: Ledger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    async {
        let key = unlock(&state.wallet, &req.seed_phrase)?;
        Ok::<_, ApiError>(Json(LoginResponse {
            address: state.wallet.address(&key).to_string(),
        }))
    }
    .instrument(spans::http_request_span("POST", "/api/login"))
    .await
}

// ── Withdraw ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WithdrawRequest {
    pub seed_phrase: String,
    pub locked_balance_id: String,
    pub withdrawal_address: String,
    pub amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawResponse {
    /// UTC time of day, `HH:MM:SS`.
    pub time: String,
    pub attempt_number: u32,
    pub recipient_address: String,
    pub sender_address: String,
    /// Net amount paid out, as a decimal string.
    pub amount: String,
    pub success: bool,
    pub message: String,
}

pub async fn withdraw<L: Ledger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    body: Result<Json<WithdrawRequest>, JsonRejection>,
) -> Result<Json<WithdrawResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    async {
        let key = unlock(&state.wallet, &req.seed_phrase)?;
        let withdrawal = state
            .wallet
            .withdraw(
                &key,
                &req.amount,
                &req.locked_balance_id,
                &req.withdrawal_address,
            )
            .await?;

        info!(hash = %withdrawal.hash, "withdraw request served");
        Ok::<_, ApiError>(Json(WithdrawResponse {
            time: state.clock.now().clock_time(),
            attempt_number: 1,
            recipient_address: req.withdrawal_address.clone(),
            sender_address: state.wallet.address(&key).to_string(),
            amount: withdrawal.amount.to_string(),
            success: true,
            message: format!("Hash: {}", withdrawal.hash),
        }))
    }
    .instrument(spans::http_request_span("POST", "/api/withdraw"))
    .await
}

fn unlock<L: Ledger>(wallet: &Wallet<L>, phrase: &str) -> Result<KeyPair, ApiError> {
    wallet.login(phrase).map_err(|e| match e {
        WalletError::InvalidPhrase(_) => ApiError::InvalidSeedPhrase,
        other => other.into(),
    })
}
