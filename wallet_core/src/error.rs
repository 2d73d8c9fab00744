use custody_crypto::MnemonicError;
use custody_transactions::{BuildError, DecodeError, Failure, SigningError};
use custody_types::{ParseError, TxHash};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Coarse error classes. Each one implies a different client reaction, so
/// errors are never moved from one class to another on the way up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input. Nothing was sent to the ledger.
    Input,
    /// The account does not exist on the ledger.
    NotFound,
    /// The ledger could not be reached, or a submission's outcome is unknown.
    Network,
    /// The ledger evaluated and rejected the transaction. The sequence
    /// number is consumed.
    LedgerRejection,
    /// The ledger turned the submission away without evaluating it, for
    /// example a rate limit. Nothing was applied.
    Refused,
    /// A ledger payload could not be interpreted.
    Decode,
    Internal,
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid secret phrase")]
    InvalidPhrase(#[source] MnemonicError),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction building error: {0}")]
    Build(#[from] BuildError),

    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("network error, outcome unknown for transaction {hash}: {detail}")]
    OutcomeUnknown { hash: TxHash, detail: String },

    #[error("transaction {hash} failed: {failure}")]
    Rejected { hash: TxHash, failure: Failure },

    #[error("transaction refused with HTTP {status}: {detail}")]
    Refused { status: u16, detail: String },

    #[error("failed to decode transaction result: {0}")]
    Decode(#[from] DecodeError),

    #[error("unexpected ledger response: {0}")]
    InvalidResponse(String),
}

impl WalletError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPhrase(_)
            | Self::InvalidAmount(_)
            | Self::InvalidAddress(_) => ErrorCategory::Input,
            Self::Build(err) => build_category(err),
            Self::AccountNotFound(_) => ErrorCategory::NotFound,
            Self::Unavailable(_) | Self::OutcomeUnknown { .. } => ErrorCategory::Network,
            Self::Rejected { .. } => ErrorCategory::LedgerRejection,
            Self::Refused { .. } => ErrorCategory::Refused,
            Self::Decode(_) | Self::InvalidResponse(_) => ErrorCategory::Decode,
            Self::Signing(_) => ErrorCategory::Internal,
        }
    }
}

/// Only field values that came from the caller are input errors. Fee and
/// operation-count limits are ours, and the sequence number is the ledger's.
fn build_category(err: &BuildError) -> ErrorCategory {
    match err {
        BuildError::InvalidAddress { .. }
        | BuildError::InvalidBalanceId { .. }
        | BuildError::InvalidAmount { .. }
        | BuildError::InvalidAsset(_)
        | BuildError::TooManyClaimants { .. } => ErrorCategory::Input,
        BuildError::NoOperations
        | BuildError::TooManyOperations { .. }
        | BuildError::MissingField { .. }
        | BuildError::FeeTooLow { .. }
        | BuildError::FeeOverflow { .. }
        | BuildError::SequenceOverflow(_) => ErrorCategory::Internal,
    }
}

impl From<GatewayError> for WalletError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(address) => Self::AccountNotFound(address),
            GatewayError::Network(detail) => Self::Unavailable(detail),
            GatewayError::InvalidResponse(detail) => Self::InvalidResponse(detail),
        }
    }
}

impl From<ParseError> for WalletError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::InvalidAddress(address) => Self::InvalidAddress(address),
            other => Self::InvalidAmount(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_error_classes() {
        assert_eq!(
            WalletError::InvalidAmount("x".into()).category(),
            ErrorCategory::Input
        );
        assert_eq!(
            WalletError::Build(BuildError::InvalidAmount { index: 1 }).category(),
            ErrorCategory::Input
        );
        assert_eq!(
            WalletError::OutcomeUnknown {
                hash: TxHash::ZERO,
                detail: "timed out".into()
            }
            .category(),
            ErrorCategory::Network
        );
        assert_eq!(
            WalletError::Rejected {
                hash: TxHash::ZERO,
                failure: Failure::Transaction {
                    fee_charged: 100,
                    code: -5,
                    reason: "tx_bad_seq",
                },
            }
            .category(),
            ErrorCategory::LedgerRejection
        );
        assert_eq!(
            WalletError::Decode(DecodeError::MissingOperationResults).category(),
            ErrorCategory::Decode
        );
    }

    #[test]
    fn refusal_is_not_a_rejection() {
        let err = WalletError::Refused {
            status: 429,
            detail: "rate limited".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Refused);
    }

    #[test]
    fn build_errors_outside_the_callers_control_are_internal() {
        for err in [
            BuildError::SequenceOverflow(i64::MAX),
            BuildError::FeeTooLow { fee: 1, min: 100 },
            BuildError::FeeOverflow {
                base_fee: u32::MAX,
                operations: 100,
            },
            BuildError::NoOperations,
        ] {
            assert_eq!(
                WalletError::Build(err.clone()).category(),
                ErrorCategory::Internal,
                "{err:?}"
            );
        }
        let bad_id = BuildError::InvalidBalanceId {
            index: 0,
            id: "deadbeef".into(),
        };
        assert_eq!(WalletError::Build(bad_id).category(), ErrorCategory::Input);
    }

    #[test]
    fn gateway_errors_keep_their_class() {
        let err: WalletError = GatewayError::NotFound("G...".into()).into();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        let err: WalletError = GatewayError::Network("refused".into()).into();
        assert_eq!(err.category(), ErrorCategory::Network);
        let err: WalletError = GatewayError::InvalidResponse("bad json".into()).into();
        assert_eq!(err.category(), ErrorCategory::Decode);
    }

    #[test]
    fn unknown_outcome_message_says_so() {
        let err = WalletError::OutcomeUnknown {
            hash: TxHash::ZERO,
            detail: "request timed out".into(),
        };
        assert!(err.to_string().contains("outcome unknown"));
    }

    #[test]
    fn parse_errors_map_to_input() {
        let err: WalletError = ParseError::EmptyAmount.into();
        assert!(matches!(err, WalletError::InvalidAmount(_)));
        let err: WalletError = ParseError::InvalidAddress("nope".into()).into();
        assert!(matches!(err, WalletError::InvalidAddress(_)));
    }
}
