//! Login: turning what the user typed into a signing key.

use custody_crypto::{derive_address, keypair_from_phrase};
use custody_types::{KeyPair, WalletAddress};

use crate::error::WalletError;

/// Derive the signing key from a mnemonic or an `S…` secret seed.
///
/// The key lives for one request. It is never stored, logged or echoed.
pub fn login(phrase: &str) -> Result<KeyPair, WalletError> {
    keypair_from_phrase(phrase).map_err(WalletError::InvalidPhrase)
}

/// The account address a key controls.
pub fn address(key: &KeyPair) -> WalletAddress {
    derive_address(&key.public)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ART: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";

    #[test]
    fn mnemonic_login_yields_ledger_address() {
        let key = login(ABANDON_ART).unwrap();
        assert_eq!(
            address(&key).as_str(),
            "GC34MI42VEGPVUDNHHM3FCVAQ2P6I2B4D3NANHXNDPFCWXQRX73S4DOB"
        );
    }

    #[test]
    fn bad_phrase_is_an_input_error() {
        let err = login("definitely not a mnemonic").unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Input);
        assert_eq!(err.to_string(), "invalid secret phrase");
    }
}
