//! Transaction assembly.

use custody_types::WalletAddress;
use tracing::debug;

use crate::envelope::{TimeBounds, TransactionEnvelope};
use crate::error::BuildError;
use crate::operation::{AccountId, Operation};

/// Most operations a single transaction may carry.
pub const MAX_OPERATIONS: usize = 100;

/// Smallest per-operation fee the ledger accepts, in stroops.
pub const MIN_BASE_FEE: u32 = 100;

/// The account a transaction is built against, as last fetched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceAccount {
    pub address: WalletAddress,
    /// Current sequence number on the ledger.
    pub sequence: i64,
}

/// Everything needed to assemble one transaction.
#[derive(Clone, Debug)]
pub struct TransactionParams {
    pub source_account: SourceAccount,
    pub operations: Vec<Operation>,
    /// Fee per operation, in stroops.
    pub base_fee: u32,
    /// Use `sequence + 1` (the normal case) rather than the fetched value.
    pub increment_sequence: bool,
    pub time_bounds: TimeBounds,
}

impl TransactionParams {
    /// Parameters with the usual choices: incremented sequence, no time bounds.
    pub fn new(source_account: SourceAccount, operations: Vec<Operation>, base_fee: u32) -> Self {
        Self {
            source_account,
            operations,
            base_fee,
            increment_sequence: true,
            time_bounds: TimeBounds::UNBOUNDED,
        }
    }
}

/// Validate the parameters and assemble an unsigned envelope.
///
/// Operations keep the order they were supplied in.
///
/// Fetching the account, building and submitting is not atomic. Two
/// transactions built from the same fetched sequence race on the ledger and
/// at most one can be accepted. A retry must re-fetch the account rather
/// than reuse or bump a previously built envelope.
pub fn build(params: TransactionParams) -> Result<TransactionEnvelope, BuildError> {
    let TransactionParams {
        source_account,
        operations,
        base_fee,
        increment_sequence,
        time_bounds,
    } = params;

    if operations.is_empty() {
        return Err(BuildError::NoOperations);
    }
    if operations.len() > MAX_OPERATIONS {
        return Err(BuildError::TooManyOperations {
            count: operations.len(),
            max: MAX_OPERATIONS,
        });
    }
    if base_fee < MIN_BASE_FEE {
        return Err(BuildError::FeeTooLow {
            fee: base_fee,
            min: MIN_BASE_FEE,
        });
    }
    base_fee
        .checked_mul(operations.len() as u32)
        .ok_or(BuildError::FeeOverflow {
            base_fee,
            operations: operations.len(),
        })?;

    let source = AccountId::from_address(source_account.address.as_str()).ok_or_else(|| {
        BuildError::InvalidAddress {
            field: "source_account",
            address: source_account.address.to_string(),
        }
    })?;

    let sequence = if increment_sequence {
        source_account
            .sequence
            .checked_add(1)
            .ok_or(BuildError::SequenceOverflow(source_account.sequence))?
    } else {
        source_account.sequence
    };

    let operations = operations
        .iter()
        .enumerate()
        .map(|(index, op)| op.resolve(index))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        source = %source_account.address,
        sequence,
        operations = operations.len(),
        base_fee,
        "built transaction"
    );

    Ok(TransactionEnvelope {
        source,
        base_fee,
        sequence,
        time_bounds,
        operations,
    })
}
