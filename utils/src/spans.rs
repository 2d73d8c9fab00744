//! Pre-built [`tracing::Span`] constructors.
//!
//! Consistent span names and fields make withdrawals traceable from the HTTP
//! request down to the ledger submission. Spans never carry key material.

use tracing::{info_span, Span};

/// Span covering one inbound HTTP API call.
pub fn http_request_span(method: &str, path: &str) -> Span {
    info_span!("http_request", method = %method, path = %path)
}

/// Span covering a withdrawal from claim to payout.
pub fn withdraw_span(sender: &str, balance_id: &str) -> Span {
    info_span!("withdraw", sender = %sender, balance_id = %balance_id)
}

/// Span covering the fetch-build-sign-submit-decode cycle of one transaction.
pub fn transaction_span(source: &str, operations: usize) -> Span {
    info_span!("transaction", source = %source, operations = operations)
}

/// Span covering a single submission to the ledger.
pub fn submit_span(hash: &str, sequence: i64) -> Span {
    info_span!("submit", hash = %hash, sequence = sequence)
}
