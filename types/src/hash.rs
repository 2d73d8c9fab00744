//! Transaction hash type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte transaction hash (SHA-256 of the signature payload).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Lowercase hex form, as the ledger reports transaction hashes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse 64 hex characters, either case.
    pub fn from_hex(input: &str) -> Option<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(input, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_accepts_either_case() {
        let hash = TxHash::new([0xab; 32]);
        assert_eq!(TxHash::from_hex(&hash.to_hex()), Some(hash));
        assert_eq!(TxHash::from_hex(&hash.to_hex().to_uppercase()), Some(hash));
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert_eq!(TxHash::from_hex("ab"), None);
        assert_eq!(TxHash::from_hex(&"zz".repeat(32)), None);
        assert_eq!(TxHash::from_hex(&"é".repeat(32)), None);
    }
}
