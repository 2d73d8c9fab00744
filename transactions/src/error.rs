use thiserror::Error;

/// Low-level XDR framing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XdrError {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("invalid {what} discriminant: {value}")]
    InvalidDiscriminant { what: &'static str, value: i32 },

    #[error("invalid boolean value: {0}")]
    InvalidBool(u32),

    #[error("length {len} exceeds maximum {max}")]
    LengthExceeded { len: usize, max: usize },

    #[error("non-zero padding byte")]
    NonZeroPadding,

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

/// Reasons a transaction cannot be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("transaction has no operations")]
    NoOperations,

    #[error("transaction has {count} operations, maximum is {max}")]
    TooManyOperations { count: usize, max: usize },

    #[error("operation {index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("invalid {field} address: {address}")]
    InvalidAddress { field: &'static str, address: String },

    #[error("operation {index}: invalid claimable balance id: {id}")]
    InvalidBalanceId { index: usize, id: String },

    #[error("operation {index}: amount must be positive")]
    InvalidAmount { index: usize },

    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    #[error("operation {index}: {count} claimants, maximum is {max}")]
    TooManyClaimants { index: usize, count: usize, max: usize },

    #[error("base fee {fee} is below the minimum of {min}")]
    FeeTooLow { fee: u32, min: u32 },

    #[error("total fee overflows: {base_fee} x {operations} operations")]
    FeeOverflow { base_fee: u32, operations: usize },

    #[error("sequence number {0} cannot be incremented")]
    SequenceOverflow(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("network passphrase is empty")]
    EmptyPassphrase,

    #[error("signing key {actual} does not control source account {expected}")]
    KeyMismatch { expected: String, actual: String },
}

/// The result payload could not be interpreted.
///
/// Distinct from a ledger failure: a decode error means this code and the
/// ledger disagree about the wire format, not that the transaction failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed result payload: {0}")]
    Xdr(#[from] XdrError),

    #[error("successful transaction carries no operation results")]
    MissingOperationResults,

    #[error("expected {expected} operation results, found {found}")]
    OperationCountMismatch { expected: usize, found: usize },

    #[error("operation {index}: result is for {found}, submitted {expected}")]
    OperationKindMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("operation {index}: unsupported operation kind {kind}")]
    UnsupportedOperation { index: usize, kind: &'static str },
}
