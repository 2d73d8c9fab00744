//! Cryptographic primitives for the custody wallet.
//!
//! - **Ed25519** for signing and signature verification
//! - **SHA-256** for network ids and transaction hashes
//! - **Strkey** address encoding (`G…` accounts, `S…` secret seeds)
//! - **BIP39 + SLIP-0010** key derivation from a secret phrase

pub mod address;
pub mod hash;
pub mod keys;
pub mod mnemonic;
pub mod sign;

pub use address::{
    decode_address, decode_secret_seed, derive_address, encode_secret_seed, parse_address,
    validate_address,
};
pub use hash::{hash_transaction, network_id, sha256, sha256_multi};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use mnemonic::{
    generate_mnemonic, keypair_from_mnemonic, keypair_from_mnemonic_path, keypair_from_phrase,
    validate_mnemonic, MnemonicError, LEDGER_COIN_TYPE,
};
pub use sign::{sign_message, verify_signature};
