//! Secret-phrase key derivation.
//!
//! A login phrase is either a BIP39 mnemonic or an `S…` secret seed strkey.
//! Mnemonics go through the BIP39 seed (empty passphrase) and SLIP-0010
//! ed25519 derivation along `m/44'/coin'/0'`, where every level is hardened.

use bip39::Mnemonic;
use custody_types::KeyPair;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use thiserror::Error;
use zeroize::Zeroize;

use crate::address::decode_secret_seed;
use crate::keys::{keypair_from_private, keypair_from_seed};

type HmacSha512 = Hmac<Sha512>;

/// BIP44 coin type registered for the ledger's wallets.
pub const LEDGER_COIN_TYPE: u32 = 314_159;

const SLIP10_ED25519_KEY: &[u8] = b"ed25519 seed";
const HARDENED: u32 = 0x8000_0000;

/// Errors arising from mnemonic operations.
#[derive(Debug, Error)]
pub enum MnemonicError {
    #[error("invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    #[error("key derivation failed: {0}")]
    DerivationFailed(String),
}

/// Generate a new 24-word BIP39 mnemonic from 256-bit entropy.
pub fn generate_mnemonic() -> Result<String, MnemonicError> {
    let mut entropy = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut entropy);
    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| MnemonicError::DerivationFailed(e.to_string()))?;
    entropy.zeroize();
    Ok(mnemonic.to_string())
}

/// Validate that a phrase is a valid BIP39 mnemonic.
pub fn validate_mnemonic(mnemonic: &str) -> bool {
    Mnemonic::parse_normalized(mnemonic).is_ok()
}

/// Derive the wallet key pair from a mnemonic at `m/44'/314159'/0'`.
pub fn keypair_from_mnemonic(mnemonic: &str) -> Result<KeyPair, MnemonicError> {
    keypair_from_mnemonic_path(mnemonic, &[44, LEDGER_COIN_TYPE, 0])
}

/// Derive a key pair from a mnemonic along an arbitrary hardened path.
///
/// `path` lists the indices without the hardened bit, e.g. `[44, 148, 0]`.
pub fn keypair_from_mnemonic_path(mnemonic: &str, path: &[u32]) -> Result<KeyPair, MnemonicError> {
    let mnemonic = Mnemonic::parse_normalized(mnemonic)
        .map_err(|e| MnemonicError::InvalidMnemonic(e.to_string()))?;

    let mut seed = mnemonic.to_seed_normalized("");
    let derived = slip10_derive(&seed, path);
    seed.zeroize();

    let (mut key, mut chain_code) = derived?;
    let keypair = keypair_from_seed(&key);
    key.zeroize();
    chain_code.zeroize();
    Ok(keypair)
}

/// Derive a key pair from whatever the user typed at login.
///
/// An `S…` strkey is taken as the raw secret seed; anything else must be a
/// BIP39 mnemonic.
pub fn keypair_from_phrase(phrase: &str) -> Result<KeyPair, MnemonicError> {
    let trimmed = phrase.trim();
    if trimmed.starts_with('S') && !trimmed.contains(' ') {
        return decode_secret_seed(trimmed)
            .map(keypair_from_private)
            .ok_or_else(|| MnemonicError::InvalidMnemonic("malformed secret seed".into()));
    }
    keypair_from_mnemonic(trimmed)
}

/// SLIP-0010 ed25519 derivation: returns (private key, chain code).
fn slip10_derive(seed: &[u8], path: &[u32]) -> Result<([u8; 32], [u8; 32]), MnemonicError> {
    let mut mac = HmacSha512::new_from_slice(SLIP10_ED25519_KEY)
        .map_err(|e| MnemonicError::DerivationFailed(e.to_string()))?;
    mac.update(seed);
    let (mut key, mut chain_code) = split_output(&mac.finalize().into_bytes());

    for index in path {
        let mut mac = HmacSha512::new_from_slice(&chain_code)
            .map_err(|e| MnemonicError::DerivationFailed(e.to_string()))?;
        mac.update(&[0u8]);
        mac.update(&key);
        mac.update(&(index | HARDENED).to_be_bytes());
        key.zeroize();
        chain_code.zeroize();
        (key, chain_code) = split_output(&mac.finalize().into_bytes());
    }

    Ok((key, chain_code))
}

fn split_output(output: &[u8]) -> ([u8; 32], [u8; 32]) {
    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&output[..32]);
    chain_code.copy_from_slice(&output[32..64]);
    (key, chain_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{derive_address, encode_secret_seed};

    const SEP5_MNEMONIC: &str =
        "illness spike retreat truth genius clock brain pass fit cave bargain toe";
    const ABANDON_ART: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";

    #[test]
    fn slip10_master_and_first_child_vectors() {
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let (master, chain) = slip10_derive(&seed, &[]).unwrap();
        assert_eq!(
            hex::encode(master),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7"
        );
        assert_eq!(
            hex::encode(chain),
            "90046a93de5380a72b5e45010748567d5ea02bbf6522f979e05c0d8d8ca9fffb"
        );
        let (child, _) = slip10_derive(&seed, &[0]).unwrap();
        assert_eq!(
            hex::encode(child),
            "68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3"
        );
    }

    #[test]
    fn sep5_account_zero_vector() {
        let kp = keypair_from_mnemonic_path(SEP5_MNEMONIC, &[44, 148, 0]).unwrap();
        assert_eq!(
            derive_address(&kp.public).as_str(),
            "GDRXE2BQUC3AZNPVFSCEZ76NJ3WWL25FYFK6RGZGIEKWE4SOOHSUJUJ6"
        );
        assert_eq!(
            encode_secret_seed(&kp.private),
            "SBGWSG6BTNCKCOB3DIFBGCVMUPQFYPA2G4O34RMTB343OYPXU5DJDVMN"
        );
    }

    #[test]
    fn ledger_coin_type_vector() {
        let kp = keypair_from_mnemonic(ABANDON_ART).unwrap();
        assert_eq!(
            derive_address(&kp.public).as_str(),
            "GC34MI42VEGPVUDNHHM3FCVAQ2P6I2B4D3NANHXNDPFCWXQRX73S4DOB"
        );
    }

    #[test]
    fn phrase_accepts_secret_seed() {
        let kp = keypair_from_phrase("SBGWSG6BTNCKCOB3DIFBGCVMUPQFYPA2G4O34RMTB343OYPXU5DJDVMN")
            .unwrap();
        assert_eq!(
            derive_address(&kp.public).as_str(),
            "GDRXE2BQUC3AZNPVFSCEZ76NJ3WWL25FYFK6RGZGIEKWE4SOOHSUJUJ6"
        );
    }

    #[test]
    fn phrase_accepts_mnemonic_with_surrounding_whitespace() {
        let padded = format!("  {ABANDON_ART}\n");
        let a = keypair_from_phrase(&padded).unwrap();
        let b = keypair_from_mnemonic(ABANDON_ART).unwrap();
        assert_eq!(a.public, b.public);
    }

    #[test]
    fn malformed_inputs_rejected() {
        assert!(keypair_from_phrase("SBADSEED").is_err());
        assert!(keypair_from_phrase("invalid words here").is_err());
        assert!(keypair_from_phrase("").is_err());
        assert!(!validate_mnemonic("not a valid mnemonic phrase"));
    }

    #[test]
    fn generated_mnemonic_round_trips_through_validation() {
        let mnemonic = generate_mnemonic().unwrap();
        assert_eq!(mnemonic.split_whitespace().count(), 24);
        assert!(validate_mnemonic(&mnemonic));
        let kp1 = keypair_from_mnemonic(&mnemonic).unwrap();
        let kp2 = keypair_from_mnemonic(&mnemonic).unwrap();
        assert_eq!(kp1.public, kp2.public);
    }
}
