//! The wallet: account queries and transaction flows over a [`Ledger`].

use custody_crypto::parse_address;
use custody_transactions::{
    build, decode, sign, Asset, BuildError, ClaimPredicate, ClaimableBalanceId, Claimant,
    DecodedResult, Operation, TimeBounds, TransactionParams,
};
use custody_types::{Amount, KeyPair, Timestamp, TxHash, WalletAddress};
use custody_utils::spans;
use tracing::{info, warn, Instrument};

use crate::balance::{net_withdrawal_amount, BASE_FEE};
use crate::config::LedgerConfig;
use crate::error::WalletError;
use crate::gateway::{Account, ClaimableBalance, Ledger, OperationRecord, SubmitError};
use crate::keys;

/// Page size for claimable balance listings.
pub const LOCKED_BALANCE_LIMIT: u32 = 50;

/// How long a balance created by [`Wallet::create_claimable`] stays locked.
pub const CLAIMABLE_LOCK_SECS: u64 = 600;

/// A completed withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub hash: TxHash,
    /// What the destination received after the fee reserve.
    pub amount: Amount,
}

/// A completed claimable balance creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBalance {
    pub hash: TxHash,
    pub balance_id: Option<ClaimableBalanceId>,
}

/// Custodial wallet operations against one ledger.
///
/// Holds no per-user state: every call takes the caller's key and fetches
/// the account afresh. Calls for the same account are not serialized. Two
/// concurrent transactions from one account race on its sequence number and
/// the ledger accepts at most one of them; callers must not retry by reusing
/// a built envelope.
pub struct Wallet<L> {
    ledger: L,
    network_passphrase: String,
}

impl<L: Ledger> Wallet<L> {
    pub fn new(ledger: L, config: &LedgerConfig) -> Self {
        Self {
            ledger,
            network_passphrase: config.network_passphrase.clone(),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn login(&self, phrase: &str) -> Result<KeyPair, WalletError> {
        keys::login(phrase)
    }

    pub fn address(&self, key: &KeyPair) -> WalletAddress {
        keys::address(key)
    }

    pub async fn account(&self, key: &KeyPair) -> Result<Account, WalletError> {
        Ok(self.ledger.fetch_account(&self.address(key)).await?)
    }

    /// Native balance of the key's account.
    pub async fn available_balance(&self, key: &KeyPair) -> Result<Amount, WalletError> {
        self.account(key)
            .await?
            .native_balance()
            .ok_or_else(|| WalletError::InvalidResponse("account has no native balance".into()))
    }

    /// Recent operations on the key's account, newest first.
    pub async fn transactions(
        &self,
        key: &KeyPair,
        limit: u32,
    ) -> Result<Vec<OperationRecord>, WalletError> {
        Ok(self
            .ledger
            .fetch_operation_history(&self.address(key), limit)
            .await?)
    }

    /// Claimable balances the key's account is a claimant of.
    pub async fn locked_balances(&self, key: &KeyPair) -> Result<Vec<ClaimableBalance>, WalletError> {
        Ok(self
            .ledger
            .fetch_claimable_balances(&self.address(key), LOCKED_BALANCE_LIMIT)
            .await?)
    }

    /// Claim a balance and forward it, minus the fee reserve, to `destination`.
    ///
    /// `requested` is the claimed balance as a decimal string. Malformed
    /// input is rejected before any ledger call. A failed or undecodable
    /// result is returned as an error and nothing is compensated: a claim
    /// that succeeded inside a failed transaction was rolled back with it.
    pub async fn withdraw(
        &self,
        key: &KeyPair,
        requested: &str,
        balance_id: &str,
        destination: &str,
    ) -> Result<Withdrawal, WalletError> {
        let sender = self.address(key);
        let span = spans::withdraw_span(sender.as_str(), balance_id);

        async {
            let amount = net_withdrawal_amount(requested)?;
            let hash = self.claim_and_withdraw(key, amount, balance_id, destination).await?;
            info!(%hash, %amount, "withdrawal complete");
            Ok::<_, WalletError>(Withdrawal { hash, amount })
        }
        .instrument(span)
        .await
    }

    /// Claim `balance_id` and pay exactly `amount` to `destination` in one
    /// transaction: `[ClaimClaimableBalance, Payment]`.
    pub async fn claim_and_withdraw(
        &self,
        key: &KeyPair,
        amount: Amount,
        balance_id: &str,
        destination: &str,
    ) -> Result<TxHash, WalletError> {
        parse_address(destination)?;
        if ClaimableBalanceId::parse(balance_id).is_none() {
            return Err(BuildError::InvalidBalanceId {
                index: 0,
                id: balance_id.to_string(),
            }
            .into());
        }

        let operations = vec![
            Operation::claim(balance_id),
            Operation::payment(destination, amount),
        ];
        self.execute(key, operations, TimeBounds::UNBOUNDED)
            .await
            .map(|(hash, _)| hash)
    }

    /// Pay `amount` of the native asset to `destination`.
    pub async fn transfer(
        &self,
        key: &KeyPair,
        amount: Amount,
        destination: &str,
    ) -> Result<TxHash, WalletError> {
        parse_address(destination)?;
        if amount.is_zero() {
            return Err(WalletError::InvalidAmount("transfer amount must be positive".into()));
        }
        self.execute(
            key,
            vec![Operation::payment(destination, amount)],
            TimeBounds::UNBOUNDED,
        )
        .await
        .map(|(hash, _)| hash)
    }

    /// Lock `amount` in a claimable balance that `recipient` can claim once
    /// [`CLAIMABLE_LOCK_SECS`] have passed since `now`.
    pub async fn create_claimable(
        &self,
        key: &KeyPair,
        recipient: &str,
        amount: Amount,
        now: Timestamp,
    ) -> Result<CreatedBalance, WalletError> {
        parse_address(recipient)?;
        if amount.is_zero() {
            return Err(WalletError::InvalidAmount("balance amount must be positive".into()));
        }
        let unlock_at = i64::try_from(now.plus_secs(CLAIMABLE_LOCK_SECS).as_secs())
            .map_err(|_| WalletError::InvalidAmount("unlock time out of range".into()))?;

        let operation = Operation::CreateClaimableBalance {
            asset: Asset::Native,
            amount,
            claimants: vec![Claimant {
                destination: recipient.to_string(),
                predicate: ClaimPredicate::not_before(unlock_at),
            }],
        };
        let (hash, decoded) = self
            .execute(key, vec![operation], TimeBounds::UNBOUNDED)
            .await?;

        Ok(CreatedBalance {
            hash,
            balance_id: decoded.created_balance_ids().first().copied(),
        })
    }

    /// Fetch, build, sign, submit and decode one transaction.
    ///
    /// Returns only when the ledger's result decodes to success.
    async fn execute(
        &self,
        key: &KeyPair,
        operations: Vec<Operation>,
        time_bounds: TimeBounds,
    ) -> Result<(TxHash, DecodedResult), WalletError> {
        let source = self.address(key);
        let span = spans::transaction_span(source.as_str(), operations.len());

        async {
            let account: Account = self.ledger.fetch_account(&source).await?;

            let mut params = TransactionParams::new(account.source_account(), operations, BASE_FEE);
            params.time_bounds = time_bounds;
            let unsigned = build(params)?;
            let sequence = unsigned.sequence();
            let kinds = unsigned.operation_kinds();

            let signed = sign(unsigned, key, &self.network_passphrase)?;
            let hash = signed.hash();

            let submitted = self
                .ledger
                .submit(&signed)
                .instrument(spans::submit_span(&hash.to_hex(), sequence))
                .await;

            let outcome = match submitted {
                Ok(outcome) => outcome,
                Err(SubmitError::Rejected(outcome)) => {
                    return match decode(&outcome.result_xdr, &kinds)? {
                        DecodedResult::Failure(failure) => {
                            warn!(%hash, %failure, "transaction rejected");
                            Err(WalletError::Rejected { hash, failure })
                        }
                        DecodedResult::Success { .. } => Err(WalletError::InvalidResponse(
                            format!("rejected transaction {hash} carries a success result"),
                        )),
                    };
                }
                Err(SubmitError::Network(detail)) => {
                    warn!(%hash, %detail, "submission outcome unknown");
                    return Err(WalletError::OutcomeUnknown { hash, detail });
                }
                Err(SubmitError::Refused { status, detail }) => {
                    return Err(WalletError::Refused { status, detail });
                }
                Err(SubmitError::InvalidResponse(detail)) => {
                    return Err(WalletError::InvalidResponse(detail));
                }
            };

            let decoded = decode(&outcome.result_xdr, &kinds).map_err(|e| {
                warn!(hash = %outcome.hash, error = %e, "result payload did not decode");
                e
            })?;
            match decoded {
                DecodedResult::Success { .. } if !outcome.successful => {
                    Err(WalletError::InvalidResponse(format!(
                        "transaction {} flagged unsuccessful but its result reports success",
                        outcome.hash
                    )))
                }
                DecodedResult::Success { fee_charged, .. } => {
                    info!(hash = %outcome.hash, fee_charged, "transaction applied");
                    Ok((outcome.hash, decoded))
                }
                DecodedResult::Failure(failure) => {
                    warn!(hash = %outcome.hash, %failure, "transaction failed");
                    Err(WalletError::Rejected {
                        hash: outcome.hash,
                        failure,
                    })
                }
            }
        }
        .instrument(span)
        .await
    }
}
