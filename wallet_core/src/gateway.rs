//! Seams between the wallet and the remote ledger.
//!
//! [`AccountGateway`] covers the read side and [`Submitter`] the write side.
//! The HTTP implementation is [`crate::HorizonClient`]; tests use the
//! in-memory double from the nullables crate. Neither layer caches or
//! retries: faults surface exactly as the ledger reported them.

use async_trait::async_trait;
use custody_transactions::{Asset, ClaimPredicate, SignedEnvelope, SourceAccount};
use custody_types::{Amount, TxHash, WalletAddress};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Read-side ledger failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("account not found: {0}")]
    NotFound(String),

    #[error("ledger unreachable: {0}")]
    Network(String),

    #[error("unexpected ledger response: {0}")]
    InvalidResponse(String),
}

/// Submission failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The request may or may not have reached the ledger. A timeout does
    /// not mean the transaction was not applied.
    #[error("submission outcome unknown: {0}")]
    Network(String),

    /// The ledger evaluated the transaction and refused it. The payload says
    /// why and the sequence number may have been consumed.
    #[error("transaction rejected by the ledger")]
    Rejected(SubmissionOutcome),

    /// Refused before evaluation (malformed envelope, rate limiting). Nothing
    /// was applied.
    #[error("submission refused with HTTP {status}: {detail}")]
    Refused { status: u16, detail: String },

    #[error("unexpected ledger response: {0}")]
    InvalidResponse(String),
}

/// Read access to account state.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn fetch_account(&self, address: &WalletAddress) -> Result<Account, GatewayError>;

    /// Claimable balances that list `claimant` as a claimant.
    async fn fetch_claimable_balances(
        &self,
        claimant: &WalletAddress,
        limit: u32,
    ) -> Result<Vec<ClaimableBalance>, GatewayError>;

    /// Past operations touching `address`, most recent first.
    async fn fetch_operation_history(
        &self,
        address: &WalletAddress,
        limit: u32,
    ) -> Result<Vec<OperationRecord>, GatewayError>;
}

#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmissionOutcome, SubmitError>;
}

/// Both halves of the ledger, as the wallet needs them.
pub trait Ledger: AccountGateway + Submitter {}

impl<T: AccountGateway + Submitter> Ledger for T {}

/// Snapshot of an account. Never updated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: WalletAddress,
    pub sequence: i64,
    pub balances: Vec<Balance>,
}

impl Account {
    /// The first native balance entry.
    pub fn native_balance(&self) -> Option<Amount> {
        self.balances
            .iter()
            .find(|b| b.asset.is_native())
            .map(|b| b.balance)
    }

    pub fn source_account(&self) -> SourceAccount {
        SourceAccount {
            address: self.address.clone(),
            sequence: self.sequence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: Asset,
    pub balance: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimantRecord {
    pub destination: String,
    pub predicate: ClaimPredicate,
}

/// A claimable balance as listed by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimableBalance {
    pub id: String,
    pub asset: Asset,
    pub amount: Amount,
    #[serde(default)]
    pub sponsor: Option<String>,
    #[serde(default)]
    pub last_modified_time: Option<String>,
    pub claimants: Vec<ClaimantRecord>,
}

impl ClaimableBalance {
    /// Whether `address` may claim this balance at `unix_time`.
    ///
    /// `Some(false)` when `address` is not a claimant; `None` when the
    /// predicate cannot be evaluated without the creation time.
    pub fn claimable_by(&self, address: &WalletAddress, unix_time: i64) -> Option<bool> {
        match self
            .claimants
            .iter()
            .find(|c| c.destination == address.as_str())
        {
            Some(claimant) => claimant.predicate.is_satisfied_at(unix_time),
            None => Some(false),
        }
    }
}

/// One entry of an account's operation history.
///
/// Only the fields common to every operation type are typed; the rest are
/// kept as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
    pub transaction_hash: String,
    #[serde(default = "default_true")]
    pub transaction_successful: bool,
    pub source_account: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

/// What the ledger said about a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub hash: TxHash,
    pub successful: bool,
    /// Raw binary `TransactionResult`.
    pub result_xdr: Vec<u8>,
}
