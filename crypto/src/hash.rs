//! SHA-256 hashing for network ids and transactions.

use custody_types::TxHash;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// The network id: SHA-256 of the network passphrase.
///
/// Every signature payload starts with this value, which is what ties a
/// signature to exactly one network.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    sha256(passphrase.as_bytes())
}

/// Hash a serialized signature payload to produce its `TxHash`.
pub fn hash_transaction(payload: &[u8]) -> TxHash {
    TxHash::new(sha256(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn multi_equivalent_to_concatenation() {
        assert_eq!(sha256(b"helloworld"), sha256_multi(&[b"hello", b"world"]));
    }

    #[test]
    fn network_id_of_public_test_passphrase() {
        assert_eq!(
            hex::encode(network_id("Test SDF Network ; September 2015")),
            "cee0302d59844d32bdca915c8203dd44b33fbb7edc19051ea37abedf28ecd472"
        );
    }

    #[test]
    fn different_passphrases_give_different_ids() {
        assert_ne!(network_id("Pi Network"), network_id("Pi Testnet"));
    }

    #[test]
    fn hash_transaction_returns_txhash() {
        assert!(!hash_transaction(b"payload").is_zero());
    }
}
