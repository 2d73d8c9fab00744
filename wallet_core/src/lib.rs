//! Wallet core for the custody backend.
//!
//! Everything between an HTTP request and the ledger:
//! - Login: deriving the signing key from a secret phrase
//! - Account, balance and history queries
//! - Withdrawals, transfers and claimable balance creation
//! - The ledger seams ([`AccountGateway`], [`Submitter`]) and their HTTP
//!   implementation ([`HorizonClient`])

pub mod balance;
pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod horizon;
pub mod keys;
pub mod wallet;

pub use balance::{net_withdrawal_amount, BASE_FEE, WITHDRAWAL_FEE_RESERVE};
pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, LedgerConfig};
pub use error::{ErrorCategory, WalletError};
pub use gateway::{
    Account, AccountGateway, Balance, ClaimableBalance, ClaimantRecord, GatewayError, Ledger,
    OperationRecord, SubmissionOutcome, SubmitError, Submitter,
};
pub use horizon::HorizonClient;
pub use wallet::{CreatedBalance, Wallet, Withdrawal, CLAIMABLE_LOCK_SECS, LOCKED_BALANCE_LIMIT};
