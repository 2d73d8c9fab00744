//! Account address type (`G…` strkey).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A ledger account address in strkey form, e.g. `GAAAA…WHF`.
///
/// Construct via `custody_crypto::derive_address` or
/// `custody_crypto::parse_address`, which validate the checksum. [`WalletAddress::new`]
/// only checks the shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Leading character of every account address.
    pub const PREFIX: char = 'G';

    /// Length of an encoded account address.
    pub const ENCODED_LEN: usize = 56;

    /// Wrap an already-encoded address string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shape check only: prefix and length. Checksums are verified by the crypto crate.
    pub fn is_well_formed(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() == Self::ENCODED_LEN
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
