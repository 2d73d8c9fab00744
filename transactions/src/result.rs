//! Transaction result decoding.
//!
//! The ledger answers a submission with a binary `TransactionResult`: the fee
//! charged, a transaction-level code and, when the transaction was applied,
//! one result union per operation. [`decode`] turns those bytes into a
//! [`DecodedResult`]. The same model types encode results, which the test
//! doubles use to script ledger answers.

use std::fmt;

use tracing::warn;

use crate::builder::MAX_OPERATIONS;
use crate::error::{DecodeError, XdrError};
use crate::operation::{operation_type_name, ClaimableBalanceId, OperationKind};
use crate::xdr::{ToXdr, XdrReader, XdrWriter};

macro_rules! result_codes {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $value:literal => $text:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const fn code(self) -> i32 {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            pub const fn is_success(self) -> bool {
                self.code() == 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

result_codes! {
    /// Transaction-level result code.
    TransactionResultCode {
        FeeBumpInnerSuccess = 1 => "tx_fee_bump_inner_success",
        Success = 0 => "tx_success",
        Failed = -1 => "tx_failed",
        TooEarly = -2 => "tx_too_early",
        TooLate = -3 => "tx_too_late",
        MissingOperation = -4 => "tx_missing_operation",
        BadSeq = -5 => "tx_bad_seq",
        BadAuth = -6 => "tx_bad_auth",
        InsufficientBalance = -7 => "tx_insufficient_balance",
        NoAccount = -8 => "tx_no_account",
        InsufficientFee = -9 => "tx_insufficient_fee",
        BadAuthExtra = -10 => "tx_bad_auth_extra",
        InternalError = -11 => "tx_internal_error",
        NotSupported = -12 => "tx_not_supported",
        FeeBumpInnerFailed = -13 => "tx_fee_bump_inner_failed",
        BadSponsorship = -14 => "tx_bad_sponsorship",
        BadMinSeqAgeOrGap = -15 => "tx_bad_min_seq_age_or_gap",
        Malformed = -16 => "tx_malformed",
        SorobanInvalid = -17 => "tx_soroban_invalid",
    }
}

result_codes! {
    /// Outer operation result code. Anything but `Inner` means the
    /// operation was never attempted.
    OperationResultCode {
        Inner = 0 => "op_inner",
        BadAuth = -1 => "op_bad_auth",
        NoAccount = -2 => "op_no_account",
        NotSupported = -3 => "op_not_supported",
        TooManySubentries = -4 => "op_too_many_subentries",
        ExceededWorkLimit = -5 => "op_exceeded_work_limit",
        TooManySponsoring = -6 => "op_too_many_sponsoring",
    }
}

result_codes! {
    PaymentResultCode {
        Success = 0 => "success",
        Malformed = -1 => "malformed",
        Underfunded = -2 => "underfunded",
        SrcNoTrust = -3 => "src_no_trust",
        SrcNotAuthorized = -4 => "src_not_authorized",
        NoDestination = -5 => "no_destination",
        NoTrust = -6 => "no_trust",
        NotAuthorized = -7 => "not_authorized",
        LineFull = -8 => "line_full",
        NoIssuer = -9 => "no_issuer",
    }
}

result_codes! {
    ClaimClaimableBalanceResultCode {
        Success = 0 => "success",
        DoesNotExist = -1 => "does_not_exist",
        CannotClaim = -2 => "cannot_claim",
        LineFull = -3 => "line_full",
        NoTrust = -4 => "no_trust",
        NotAuthorized = -5 => "not_authorized",
    }
}

result_codes! {
    CreateClaimableBalanceResultCode {
        Success = 0 => "success",
        Malformed = -1 => "malformed",
        LowReserve = -2 => "low_reserve",
        NoTrust = -3 => "no_trust",
        NotAuthorized = -4 => "not_authorized",
        Underfunded = -5 => "underfunded",
    }
}

/// Per-kind result of an operation that was attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InnerResult {
    Payment(PaymentResultCode),
    ClaimClaimableBalance(ClaimClaimableBalanceResultCode),
    CreateClaimableBalance {
        code: CreateClaimableBalanceResultCode,
        /// Present exactly when `code` is success.
        balance_id: Option<ClaimableBalanceId>,
    },
}

impl InnerResult {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Payment(_) => OperationKind::Payment,
            Self::ClaimClaimableBalance(_) => OperationKind::ClaimClaimableBalance,
            Self::CreateClaimableBalance { .. } => OperationKind::CreateClaimableBalance,
        }
    }

    pub fn verdict(&self) -> OperationVerdict {
        let (success, name) = match self {
            Self::Payment(code) => (code.is_success(), code.name()),
            Self::ClaimClaimableBalance(code) => (code.is_success(), code.name()),
            Self::CreateClaimableBalance { code, .. } => (code.is_success(), code.name()),
        };
        if success {
            OperationVerdict::Success
        } else {
            OperationVerdict::Failure(name)
        }
    }

    fn read_xdr(r: &mut XdrReader<'_>, index: usize) -> Result<Self, DecodeError> {
        let type_code = r.read_i32()?;
        let kind = OperationKind::from_type_code(type_code).ok_or(DecodeError::UnsupportedOperation {
            index,
            kind: operation_type_name(type_code),
        })?;
        let code = r.read_i32()?;
        let invalid = |what| XdrError::InvalidDiscriminant { what, value: code };

        Ok(match kind {
            OperationKind::Payment => Self::Payment(
                PaymentResultCode::from_code(code).ok_or_else(|| invalid("payment result"))?,
            ),
            OperationKind::ClaimClaimableBalance => Self::ClaimClaimableBalance(
                ClaimClaimableBalanceResultCode::from_code(code)
                    .ok_or_else(|| invalid("claim claimable balance result"))?,
            ),
            OperationKind::CreateClaimableBalance => {
                let code = CreateClaimableBalanceResultCode::from_code(code)
                    .ok_or_else(|| invalid("create claimable balance result"))?;
                let balance_id = if code.is_success() {
                    Some(ClaimableBalanceId::read_xdr(r)?)
                } else {
                    None
                };
                Self::CreateClaimableBalance { code, balance_id }
            }
        })
    }
}

impl ToXdr for InnerResult {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_i32(self.kind().type_code());
        match self {
            Self::Payment(code) => w.write_i32(code.code()),
            Self::ClaimClaimableBalance(code) => w.write_i32(code.code()),
            Self::CreateClaimableBalance { code, balance_id } => {
                w.write_i32(code.code());
                if let Some(id) = balance_id {
                    id.write_xdr(w);
                }
            }
        }
    }
}

/// Outer code of an operation that was never attempted. Holds anything but
/// `OperationResultCode::Inner`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotAttempted(OperationResultCode);

impl NotAttempted {
    /// `None` for `OperationResultCode::Inner`, which always carries a
    /// per-kind result.
    pub fn new(code: OperationResultCode) -> Option<Self> {
        (code != OperationResultCode::Inner).then_some(Self(code))
    }

    pub fn code(self) -> OperationResultCode {
        self.0
    }
}

/// Result union for one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationResult {
    Inner(InnerResult),
    Outer(NotAttempted),
}

impl OperationResult {
    pub fn not_attempted(code: OperationResultCode) -> Option<Self> {
        NotAttempted::new(code).map(Self::Outer)
    }

    pub fn payment(code: PaymentResultCode) -> Self {
        Self::Inner(InnerResult::Payment(code))
    }

    pub fn claim(code: ClaimClaimableBalanceResultCode) -> Self {
        Self::Inner(InnerResult::ClaimClaimableBalance(code))
    }

    pub fn created(balance_id: ClaimableBalanceId) -> Self {
        Self::Inner(InnerResult::CreateClaimableBalance {
            code: CreateClaimableBalanceResultCode::Success,
            balance_id: Some(balance_id),
        })
    }

    pub fn create_failed(code: CreateClaimableBalanceResultCode) -> Self {
        Self::Inner(InnerResult::CreateClaimableBalance {
            code,
            balance_id: None,
        })
    }

    pub fn verdict(&self) -> OperationVerdict {
        match self {
            Self::Inner(inner) => inner.verdict(),
            Self::Outer(outer) => OperationVerdict::Failure(outer.code().name()),
        }
    }

    fn read_xdr(r: &mut XdrReader<'_>, index: usize) -> Result<Self, DecodeError> {
        let value = r.read_i32()?;
        match OperationResultCode::from_code(value) {
            Some(OperationResultCode::Inner) => InnerResult::read_xdr(r, index).map(Self::Inner),
            Some(code) => Ok(Self::Outer(NotAttempted(code))),
            None => Err(XdrError::InvalidDiscriminant {
                what: "operation result",
                value,
            }
            .into()),
        }
    }
}

impl ToXdr for OperationResult {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Inner(inner) => {
                w.write_i32(OperationResultCode::Inner.code());
                inner.write_xdr(w);
            }
            Self::Outer(outer) => w.write_i32(outer.code().code()),
        }
    }
}

/// A whole transaction result, as the ledger encodes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionResult {
    pub fee_charged: i64,
    pub code: TransactionResultCode,
    /// Carried for `Success` and `Failed`. Fee-bump arms are never produced
    /// for the plain envelopes this backend submits and encode no payload.
    pub operations: Vec<OperationResult>,
}

impl TransactionResult {
    pub fn success(fee_charged: i64, operations: Vec<OperationResult>) -> Self {
        Self {
            fee_charged,
            code: TransactionResultCode::Success,
            operations,
        }
    }

    pub fn failed(fee_charged: i64, code: TransactionResultCode) -> Self {
        Self {
            fee_charged,
            code,
            operations: Vec::new(),
        }
    }
}

impl ToXdr for TransactionResult {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_i64(self.fee_charged);
        w.write_i32(self.code.code());
        if matches!(
            self.code,
            TransactionResultCode::Success | TransactionResultCode::Failed
        ) {
            w.write_len(self.operations.len());
            for op in &self.operations {
                op.write_xdr(w);
            }
        }
        // ext v0
        w.write_i32(0);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationVerdict {
    Success,
    Failure(&'static str),
}

impl OperationVerdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Why a transaction did not take effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    /// The transaction-level code was not success. Operation results were
    /// not inspected.
    Transaction {
        fee_charged: i64,
        code: i32,
        reason: &'static str,
    },
    /// An operation failed. `verdicts` holds every operation's outcome.
    Operation {
        fee_charged: i64,
        index: usize,
        reason: &'static str,
        verdicts: Vec<OperationVerdict>,
    },
}

impl Failure {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Transaction { reason, .. } | Self::Operation { reason, .. } => reason,
        }
    }

    /// Index of the first failing operation, for operation failures.
    pub fn operation_index(&self) -> Option<usize> {
        match self {
            Self::Transaction { .. } => None,
            Self::Operation { index, .. } => Some(*index),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction { reason, .. } => write!(f, "transaction failed: {reason}"),
            Self::Operation { index, reason, .. } => {
                write!(f, "operation {index} failed: {reason}")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedResult {
    /// The transaction was applied and every operation succeeded.
    Success {
        fee_charged: i64,
        operations: Vec<OperationResult>,
    },
    Failure(Failure),
}

impl DecodedResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Ids of balances created by a successful transaction, in operation order.
    pub fn created_balance_ids(&self) -> Vec<ClaimableBalanceId> {
        match self {
            Self::Success { operations, .. } => operations
                .iter()
                .filter_map(|op| match op {
                    OperationResult::Inner(InnerResult::CreateClaimableBalance {
                        balance_id, ..
                    }) => *balance_id,
                    _ => None,
                })
                .collect(),
            Self::Failure(_) => Vec::new(),
        }
    }
}

/// Decode a raw result payload for a transaction that submitted the
/// operations in `submitted`, in order.
///
/// A non-success transaction code is reported as a failure straight away and
/// the rest of the payload is ignored. On success the payload must carry one
/// result per submitted operation, each of the submitted kind; anything else
/// is a [`DecodeError`], never a failure.
pub fn decode(raw: &[u8], submitted: &[OperationKind]) -> Result<DecodedResult, DecodeError> {
    let mut r = XdrReader::new(raw);
    let fee_charged = r.read_i64()?;
    let code = r.read_i32()?;

    if code != TransactionResultCode::Success.code() {
        let reason = TransactionResultCode::from_code(code).map_or("tx_unknown", |c| c.name());
        return Ok(DecodedResult::Failure(Failure::Transaction {
            fee_charged,
            code,
            reason,
        }));
    }

    let count = r.read_len(MAX_OPERATIONS)?;
    if count == 0 {
        return Err(DecodeError::MissingOperationResults);
    }
    if count != submitted.len() {
        return Err(DecodeError::OperationCountMismatch {
            expected: submitted.len(),
            found: count,
        });
    }

    let mut operations = Vec::with_capacity(count);
    for (index, expected) in submitted.iter().enumerate() {
        let result = OperationResult::read_xdr(&mut r, index)?;
        if let OperationResult::Inner(inner) = &result {
            if inner.kind() != *expected {
                return Err(DecodeError::OperationKindMismatch {
                    index,
                    expected: expected.name(),
                    found: inner.kind().name(),
                });
            }
        }
        operations.push(result);
    }

    match r.read_i32()? {
        0 => {}
        value => {
            return Err(XdrError::InvalidDiscriminant {
                what: "transaction result ext",
                value,
            }
            .into())
        }
    }
    r.finish()?;

    let verdicts: Vec<OperationVerdict> = operations.iter().map(OperationResult::verdict).collect();
    match verdicts.iter().position(|v| !v.is_success()) {
        None => Ok(DecodedResult::Success {
            fee_charged,
            operations,
        }),
        Some(index) => {
            let reason = match verdicts[index] {
                OperationVerdict::Failure(reason) => reason,
                OperationVerdict::Success => "unknown",
            };
            // The ledger reported success overall while an operation failed.
            warn!(index, reason, "transaction succeeded with a failed operation");
            Ok(DecodedResult::Failure(Failure::Operation {
                fee_charged,
                index,
                reason,
                verdicts,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    const WITHDRAW: [OperationKind; 2] = [OperationKind::ClaimClaimableBalance, OperationKind::Payment];

    fn claim_ok() -> OperationResult {
        OperationResult::claim(ClaimClaimableBalanceResultCode::Success)
    }

    fn pay(code: PaymentResultCode) -> OperationResult {
        OperationResult::payment(code)
    }

    #[test]
    fn ledger_payment_success_payload() {
        let raw = BASE64.decode("AAAAAAAAAGQAAAAAAAAAAQAAAAAAAAABAAAAAAAAAAA=").unwrap();
        let decoded = decode(&raw, &[OperationKind::Payment]).unwrap();
        assert_eq!(
            decoded,
            DecodedResult::Success {
                fee_charged: 100,
                operations: vec![pay(PaymentResultCode::Success)],
            }
        );
        assert_eq!(TransactionResult::success(100, vec![pay(PaymentResultCode::Success)]).to_xdr(), raw);
    }

    #[test]
    fn ledger_bad_seq_payload() {
        let raw = BASE64.decode("AAAAAAAAAAD////7AAAAAA==").unwrap();
        let decoded = decode(&raw, &WITHDRAW).unwrap();
        match decoded {
            DecodedResult::Failure(failure) => {
                assert_eq!(failure.reason(), "tx_bad_seq");
                assert_eq!(failure.operation_index(), None);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn two_successful_operations() {
        let raw = TransactionResult::success(200, vec![claim_ok(), pay(PaymentResultCode::Success)]).to_xdr();
        let decoded = decode(&raw, &WITHDRAW).unwrap();
        assert!(decoded.is_success());
    }

    #[test]
    fn short_operation_list_is_a_decode_error() {
        let raw = TransactionResult::success(200, vec![claim_ok()]).to_xdr();
        assert_eq!(
            decode(&raw, &WITHDRAW),
            Err(DecodeError::OperationCountMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn empty_operation_list_is_a_decode_error() {
        let raw = TransactionResult::success(200, vec![]).to_xdr();
        assert_eq!(decode(&raw, &WITHDRAW), Err(DecodeError::MissingOperationResults));
    }

    #[test]
    fn failure_code_ignores_operation_results() {
        let mut raw = TransactionResult::failed(100, TransactionResultCode::Failed).to_xdr();
        raw.truncate(12);
        // Whatever follows the code is not read.
        raw.extend_from_slice(&[0xde, 0xad, 0xbe]);
        let decoded = decode(&raw, &WITHDRAW).unwrap();
        assert_eq!(
            decoded,
            DecodedResult::Failure(Failure::Transaction {
                fee_charged: 100,
                code: -1,
                reason: "tx_failed",
            })
        );
    }

    #[test]
    fn unknown_transaction_code_is_still_a_failure() {
        let mut w = XdrWriter::new();
        w.write_i64(0);
        w.write_i32(-99);
        let decoded = decode(&w.into_bytes(), &WITHDRAW).unwrap();
        assert!(matches!(
            decoded,
            DecodedResult::Failure(Failure::Transaction { code: -99, reason: "tx_unknown", .. })
        ));
    }

    #[test]
    fn underfunded_payment_names_its_index() {
        let raw = TransactionResult::success(
            200,
            vec![claim_ok(), pay(PaymentResultCode::Underfunded)],
        )
        .to_xdr();
        let decoded = decode(&raw, &WITHDRAW).unwrap();
        assert_eq!(
            decoded,
            DecodedResult::Failure(Failure::Operation {
                fee_charged: 200,
                index: 1,
                reason: "underfunded",
                verdicts: vec![OperationVerdict::Success, OperationVerdict::Failure("underfunded")],
            })
        );
        if let DecodedResult::Failure(f) = decoded {
            assert_eq!(f.to_string(), "operation 1 failed: underfunded");
        }
    }

    #[test]
    fn first_failure_wins_and_all_verdicts_are_kept() {
        let raw = TransactionResult::success(
            200,
            vec![
                OperationResult::claim(ClaimClaimableBalanceResultCode::CannotClaim),
                OperationResult::not_attempted(OperationResultCode::BadAuth).unwrap(),
            ],
        )
        .to_xdr();
        match decode(&raw, &WITHDRAW).unwrap() {
            DecodedResult::Failure(Failure::Operation {
                index,
                reason,
                verdicts,
                ..
            }) => {
                assert_eq!(index, 0);
                assert_eq!(reason, "cannot_claim");
                assert_eq!(verdicts[1], OperationVerdict::Failure("op_bad_auth"));
            }
            other => panic!("expected operation failure, got {other:?}"),
        }
    }

    #[test]
    fn inner_code_cannot_mark_an_operation_as_not_attempted() {
        assert_eq!(OperationResult::not_attempted(OperationResultCode::Inner), None);
        let skipped = OperationResult::not_attempted(OperationResultCode::NoAccount).unwrap();
        assert_eq!(skipped.verdict(), OperationVerdict::Failure("op_no_account"));
        assert_eq!(skipped.to_xdr(), (-2i32).to_be_bytes().to_vec());
    }

    #[test]
    fn unsupported_operation_kind_is_a_decode_error() {
        let mut w = XdrWriter::new();
        w.write_i64(100);
        w.write_i32(0);
        w.write_len(1);
        w.write_i32(0); // opINNER
        w.write_i32(0); // CREATE_ACCOUNT
        w.write_i32(0);
        w.write_i32(0);
        assert_eq!(
            decode(&w.into_bytes(), &[OperationKind::Payment]),
            Err(DecodeError::UnsupportedOperation {
                index: 0,
                kind: "create_account"
            })
        );
    }

    #[test]
    fn mismatched_operation_kind_is_a_decode_error() {
        let raw = TransactionResult::success(200, vec![pay(PaymentResultCode::Success), claim_ok()]).to_xdr();
        assert!(matches!(
            decode(&raw, &WITHDRAW),
            Err(DecodeError::OperationKindMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn unknown_per_kind_code_is_a_decode_error() {
        let mut w = XdrWriter::new();
        w.write_i64(100);
        w.write_i32(0);
        w.write_len(1);
        w.write_i32(0);
        w.write_i32(1);
        w.write_i32(-42);
        w.write_i32(0);
        assert!(matches!(
            decode(&w.into_bytes(), &[OperationKind::Payment]),
            Err(DecodeError::Xdr(XdrError::InvalidDiscriminant { value: -42, .. }))
        ));
    }

    #[test]
    fn truncated_and_padded_payloads_rejected() {
        let raw = TransactionResult::success(200, vec![claim_ok(), pay(PaymentResultCode::Success)]).to_xdr();
        assert!(matches!(
            decode(&raw[..raw.len() - 4], &WITHDRAW),
            Err(DecodeError::Xdr(XdrError::UnexpectedEof { .. }))
        ));

        let mut padded = raw.clone();
        padded.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(
            decode(&padded, &WITHDRAW),
            Err(DecodeError::Xdr(XdrError::TrailingBytes(4)))
        );
    }

    #[test]
    fn created_balance_id_is_surfaced() {
        let id = ClaimableBalanceId([7u8; 32]);
        let raw = TransactionResult::success(100, vec![OperationResult::created(id)]).to_xdr();
        let decoded = decode(&raw, &[OperationKind::CreateClaimableBalance]).unwrap();
        assert_eq!(decoded.created_balance_ids(), vec![id]);

        let raw = TransactionResult::success(
            100,
            vec![OperationResult::create_failed(CreateClaimableBalanceResultCode::LowReserve)],
        )
        .to_xdr();
        match decode(&raw, &[OperationKind::CreateClaimableBalance]).unwrap() {
            DecodedResult::Failure(f) => assert_eq!(f.reason(), "low_reserve"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn code_tables_are_consistent() {
        for code in -17..=1 {
            let parsed = TransactionResultCode::from_code(code).unwrap();
            assert_eq!(parsed.code(), code);
            assert!(parsed.name().starts_with("tx_"));
        }
        assert_eq!(TransactionResultCode::from_code(2), None);
        assert_eq!(PaymentResultCode::NoIssuer.code(), -9);
        assert_eq!(ClaimClaimableBalanceResultCode::from_code(-5), Some(ClaimClaimableBalanceResultCode::NotAuthorized));
        assert_eq!(OperationResultCode::TooManySponsoring.to_string(), "op_too_many_sponsoring");
    }
}
