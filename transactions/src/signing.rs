use custody_crypto::{derive_address, sign_message};
use custody_types::KeyPair;

use crate::envelope::{DecoratedSignature, SignedEnvelope, TransactionEnvelope};
use crate::error::SigningError;

/// Sign a transaction for the network identified by `network_passphrase`.
///
/// The passphrase hash is part of the signed payload, so the signature only
/// validates on that network. Ed25519 is deterministic: signing the same
/// transaction with the same key and passphrase yields identical bytes.
pub fn sign(
    transaction: TransactionEnvelope,
    key: &KeyPair,
    network_passphrase: &str,
) -> Result<SignedEnvelope, SigningError> {
    if network_passphrase.is_empty() {
        return Err(SigningError::EmptyPassphrase);
    }
    if key.public.0 != transaction.source.0 {
        return Err(SigningError::KeyMismatch {
            expected: transaction.source_address().to_string(),
            actual: derive_address(&key.public).to_string(),
        });
    }

    let hash = transaction.hash(network_passphrase);
    let signature = sign_message(hash.as_bytes(), &key.private);

    Ok(SignedEnvelope {
        transaction,
        hash,
        signatures: vec![DecoratedSignature {
            hint: key.public.hint(),
            signature,
        }],
    })
}
