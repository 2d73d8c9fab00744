//! Nullable ledger: scripted account state and submission outcomes.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use custody_transactions::{
    Asset, ClaimClaimableBalanceResultCode, ClaimableBalanceId, OperationKind, OperationResult,
    PaymentResultCode, SignedEnvelope, ToXdr, TransactionResult, TransactionResultCode,
};
use custody_types::{Amount, WalletAddress};
use custody_wallet_core::{
    Account, AccountGateway, Balance, ClaimableBalance, GatewayError, OperationRecord,
    SubmissionOutcome, SubmitError, Submitter,
};

/// Id reported for balances created while no submission is scripted.
pub const DEFAULT_CREATED_BALANCE_ID: ClaimableBalanceId = ClaimableBalanceId([0xcb; 32]);

/// Fee reported for submissions that are not scripted.
pub const DEFAULT_FEE_CHARGED: i64 = 2_000_000;

/// How the ledger answers the next submission.
#[derive(Debug, Clone)]
pub enum ScriptedSubmit {
    /// Accepted over HTTP with this result. A non-success code is still
    /// reported with `successful: false`.
    Applied(TransactionResult),
    /// Evaluated and refused, with this result attached.
    Rejected(TransactionResult),
    /// Accepted over HTTP with a hand-made payload.
    Raw {
        successful: bool,
        result_xdr: Vec<u8>,
    },
    /// The request never came back.
    Network(String),
    Refused { status: u16, detail: String },
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<String, Account>,
    claimable: Vec<ClaimableBalance>,
    history: HashMap<String, Vec<OperationRecord>>,
    read_failure: Option<GatewayError>,
    scripted: VecDeque<ScriptedSubmit>,
    submitted: Vec<SignedEnvelope>,
    read_calls: usize,
}

/// An in-memory ledger for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullLedger {
    state: Mutex<LedgerState>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an account holding only a native balance.
    pub fn with_account(self, address: &WalletAddress, sequence: i64, native: Amount) -> Self {
        self.put_account(Account {
            address: address.clone(),
            sequence,
            balances: vec![Balance {
                asset: Asset::Native,
                balance: native,
            }],
        });
        self
    }

    pub fn put_account(&self, account: Account) {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(account.address.to_string(), account);
    }

    pub fn add_claimable_balance(&self, balance: ClaimableBalance) {
        self.state.lock().unwrap().claimable.push(balance);
    }

    /// Append to `address`'s history. Records are listed in insertion order,
    /// so add the newest first.
    pub fn add_operation(&self, address: &WalletAddress, record: OperationRecord) {
        self.state
            .lock()
            .unwrap()
            .history
            .entry(address.to_string())
            .or_default()
            .push(record);
    }

    /// Make every read fail with `error` until cleared with `None`.
    pub fn fail_reads(&self, error: Option<GatewayError>) {
        self.state.lock().unwrap().read_failure = error;
    }

    /// Queue the answer to a future submission. Answers are used in order;
    /// once the queue is empty every operation succeeds.
    pub fn script_submit(&self, answer: ScriptedSubmit) {
        self.state.lock().unwrap().scripted.push_back(answer);
    }

    /// Every envelope submitted so far.
    pub fn submissions(&self) -> Vec<SignedEnvelope> {
        self.state.lock().unwrap().submitted.clone()
    }

    /// Number of read calls, failed ones included.
    pub fn read_calls(&self) -> usize {
        self.state.lock().unwrap().read_calls
    }

    /// Total ledger traffic: reads plus submissions.
    pub fn total_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.read_calls + state.submitted.len()
    }

    pub fn sequence_of(&self, address: &WalletAddress) -> Option<i64> {
        self.state
            .lock()
            .unwrap()
            .accounts
            .get(address.as_str())
            .map(|a| a.sequence)
    }

    fn begin_read(&self) -> Result<std::sync::MutexGuard<'_, LedgerState>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.read_calls += 1;
        match &state.read_failure {
            Some(err) => Err(err.clone()),
            None => Ok(state),
        }
    }
}

/// A successful result with one success entry per operation.
pub fn success_result(kinds: &[OperationKind]) -> TransactionResult {
    let operations = kinds
        .iter()
        .map(|kind| match kind {
            OperationKind::Payment => OperationResult::payment(PaymentResultCode::Success),
            OperationKind::ClaimClaimableBalance => {
                OperationResult::claim(ClaimClaimableBalanceResultCode::Success)
            }
            OperationKind::CreateClaimableBalance => {
                OperationResult::created(DEFAULT_CREATED_BALANCE_ID)
            }
        })
        .collect();
    TransactionResult::success(DEFAULT_FEE_CHARGED, operations)
}

#[async_trait]
impl AccountGateway for NullLedger {
    async fn fetch_account(&self, address: &WalletAddress) -> Result<Account, GatewayError> {
        let state = self.begin_read()?;
        state
            .accounts
            .get(address.as_str())
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(address.to_string()))
    }

    async fn fetch_claimable_balances(
        &self,
        claimant: &WalletAddress,
        limit: u32,
    ) -> Result<Vec<ClaimableBalance>, GatewayError> {
        let state = self.begin_read()?;
        Ok(state
            .claimable
            .iter()
            .filter(|b| b.claimants.iter().any(|c| c.destination == claimant.as_str()))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn fetch_operation_history(
        &self,
        address: &WalletAddress,
        limit: u32,
    ) -> Result<Vec<OperationRecord>, GatewayError> {
        let state = self.begin_read()?;
        if !state.accounts.contains_key(address.as_str()) {
            return Err(GatewayError::NotFound(address.to_string()));
        }
        Ok(state
            .history
            .get(address.as_str())
            .map(|records| records.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl Submitter for NullLedger {
    /// Applied transactions consume the source's sequence number; nothing
    /// else changes account state.
    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmissionOutcome, SubmitError> {
        let mut state = self.state.lock().unwrap();
        state.submitted.push(envelope.clone());

        let answer = state.scripted.pop_front().unwrap_or_else(|| {
            ScriptedSubmit::Applied(success_result(&envelope.transaction().operation_kinds()))
        });
        let hash = envelope.hash();

        match answer {
            ScriptedSubmit::Applied(result) => {
                let source = envelope.transaction().source_address();
                if let Some(account) = state.accounts.get_mut(source.as_str()) {
                    account.sequence = envelope.transaction().sequence();
                }
                Ok(SubmissionOutcome {
                    hash,
                    successful: result.code == TransactionResultCode::Success,
                    result_xdr: result.to_xdr(),
                })
            }
            ScriptedSubmit::Rejected(result) => Err(SubmitError::Rejected(SubmissionOutcome {
                hash,
                successful: false,
                result_xdr: result.to_xdr(),
            })),
            ScriptedSubmit::Raw {
                successful,
                result_xdr,
            } => Ok(SubmissionOutcome {
                hash,
                successful,
                result_xdr,
            }),
            ScriptedSubmit::Network(detail) => Err(SubmitError::Network(detail)),
            ScriptedSubmit::Refused { status, detail } => {
                Err(SubmitError::Refused { status, detail })
            }
        }
    }
}
