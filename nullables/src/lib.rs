//! Nullable infrastructure for deterministic testing.
//!
//! The wallet reaches the outside world only through the [`Clock`] and
//! [`Ledger`] seams. This crate provides stand-ins for both that:
//! - Return scripted values
//! - Record what was asked of them
//! - Never touch the network
//!
//! [`Clock`]: custody_wallet_core::Clock
//! [`Ledger`]: custody_wallet_core::Ledger

pub mod clock;
pub mod ledger;

pub use clock::NullClock;
pub use ledger::{
    success_result, NullLedger, ScriptedSubmit, DEFAULT_CREATED_BALANCE_ID, DEFAULT_FEE_CHARGED,
};
