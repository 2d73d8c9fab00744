//! Fundamental types for the custody wallet backend.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, hashes, fixed-point amounts, key material, timestamps and network selection.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod keys;
pub mod network;
pub mod time;

pub use address::WalletAddress;
pub use amount::Amount;
pub use error::ParseError;
pub use hash::TxHash;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use network::NetworkId;
pub use time::Timestamp;
