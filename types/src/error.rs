//! Parse errors for the textual forms of the shared types.

use thiserror::Error;

/// Errors produced when parsing amounts, networks and addresses from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("amount is empty")]
    EmptyAmount,

    #[error("amount must not be negative: {0}")]
    NegativeAmount(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount has more than {max} decimal places: {input}")]
    TooPrecise { input: String, max: u32 },

    #[error("amount out of range: {0}")]
    AmountOverflow(String),

    #[error("unknown network: {0} (expected \"mainnet\" or \"testnet\")")]
    UnknownNetwork(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
