//! Transaction construction, signing and result decoding for the ledger.
//!
//! The pipeline is linear and every stage is a pure function:
//!
//! - [`build`] validates [`Operation`]s against a [`SourceAccount`] and yields
//!   an unsigned [`TransactionEnvelope`]
//! - [`sign`] consumes the envelope and yields a [`SignedEnvelope`] bound to
//!   one network passphrase
//! - [`decode`] turns the ledger's binary result payload into a
//!   [`DecodedResult`] with one [`OperationVerdict`] per operation
//!
//! Submission lives outside this crate; only bytes cross the boundary.

pub mod builder;
pub mod envelope;
pub mod error;
pub mod operation;
pub mod result;
pub mod signing;
pub mod xdr;

pub use builder::{build, SourceAccount, TransactionParams, MAX_OPERATIONS, MIN_BASE_FEE};
pub use envelope::{DecoratedSignature, SignedEnvelope, TimeBounds, TransactionEnvelope};
pub use error::{BuildError, DecodeError, SigningError, XdrError};
pub use operation::{
    AccountId, Asset, ClaimPredicate, ClaimableBalanceId, Claimant, Operation, OperationBody,
    OperationKind, MAX_CLAIMANTS,
};
pub use result::{
    decode, ClaimClaimableBalanceResultCode, CreateClaimableBalanceResultCode, DecodedResult,
    Failure, InnerResult, NotAttempted, OperationResult, OperationResultCode,
    OperationVerdict, PaymentResultCode, TransactionResult, TransactionResultCode,
};
pub use signing::sign;
pub use xdr::ToXdr;
