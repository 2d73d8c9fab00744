//! Key material for account identity and transaction signing.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 32-byte Ed25519 public key (the account identity).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

/// A 32-byte Ed25519 secret seed.
///
/// Deliberately not `Debug`, `Clone` or `Serialize`: a signing key lives for one
/// request and must never reach a log line or a response body. Bytes are
/// zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(pub [u8; 32]);

/// A 64-byte Ed25519 signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

/// An Ed25519 key pair (public + private).
///
/// Use `custody_crypto::keypair_from_phrase()` or `custody_crypto::generate_keypair()`
/// to construct key pairs.
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Signature hint: the last four bytes of the key.
    pub fn hint(&self) -> [u8; 4] {
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&self.0[28..]);
        hint
    }
}

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("private", &"<redacted>")
            .finish()
    }
}
