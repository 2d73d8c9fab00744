//! Ed25519 key generation.

use custody_types::{KeyPair, PrivateKey, PublicKey};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

/// Generate a new Ed25519 key pair from a secure random source.
pub fn generate_keypair() -> KeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    keypair_from_seed(&signing_key.to_bytes())
}

/// Derive the public key from a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let signing_key = SigningKey::from_bytes(&private.0);
    PublicKey(signing_key.verifying_key().to_bytes())
}

/// Reconstruct a full key pair from a private key.
pub fn keypair_from_private(private: PrivateKey) -> KeyPair {
    let public = public_from_private(&private);
    KeyPair { public, private }
}

/// Derive a key pair from a 32-byte secret seed (deterministic).
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    keypair_from_private(PrivateKey(*seed))
}
