//! Unsigned and signed transaction envelopes.
//!
//! A [`TransactionEnvelope`] is produced by [`crate::build`] and consumed by
//! [`crate::sign`], which returns a [`SignedEnvelope`]. Nothing mutates an
//! envelope after construction, so a signed envelope always describes
//! exactly the transaction that was hashed.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use custody_crypto::{hash_transaction, network_id, verify_signature};
use custody_types::{PublicKey, Signature, TxHash, WalletAddress};

use crate::operation::{AccountId, OperationBody, OperationKind};
use crate::xdr::{ToXdr, XdrWriter};

/// `ENVELOPE_TYPE_TX`: domain tag for v1 transactions in both the envelope
/// and the signature payload.
const ENVELOPE_TYPE_TX: i32 = 2;

/// Most signatures an envelope may carry.
pub const MAX_SIGNATURES: usize = 20;

/// Validity window in unix seconds. Zero on either side means unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

impl TimeBounds {
    pub const UNBOUNDED: Self = Self {
        min_time: 0,
        max_time: 0,
    };

    /// Valid from now until `now + seconds`.
    pub fn timeout(now: u64, seconds: u64) -> Self {
        Self {
            min_time: 0,
            max_time: now.saturating_add(seconds),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::UNBOUNDED
    }
}

impl ToXdr for TimeBounds {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_u64(self.min_time);
        w.write_u64(self.max_time);
    }
}

/// A fully validated transaction awaiting its signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionEnvelope {
    pub(crate) source: AccountId,
    pub(crate) base_fee: u32,
    pub(crate) sequence: i64,
    pub(crate) time_bounds: TimeBounds,
    pub(crate) operations: Vec<OperationBody>,
}

impl TransactionEnvelope {
    pub fn source(&self) -> &AccountId {
        &self.source
    }

    pub fn source_address(&self) -> WalletAddress {
        self.source.address()
    }

    /// Per-operation fee rate in stroops.
    pub fn base_fee(&self) -> u32 {
        self.base_fee
    }

    /// Total fee: base fee times the operation count. The builder rejects
    /// transactions where this would overflow.
    pub fn fee(&self) -> u32 {
        self.base_fee.saturating_mul(self.operations.len() as u32)
    }

    /// Sequence number this transaction consumes.
    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn time_bounds(&self) -> TimeBounds {
        self.time_bounds
    }

    pub fn operations(&self) -> &[OperationBody] {
        &self.operations
    }

    pub fn operation_kinds(&self) -> Vec<OperationKind> {
        self.operations.iter().map(OperationBody::kind).collect()
    }

    /// Bytes that are hashed and signed: network id, envelope type, transaction.
    pub fn signature_payload(&self, network_passphrase: &str) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.write_fixed(&network_id(network_passphrase));
        w.write_i32(ENVELOPE_TYPE_TX);
        self.write_xdr(&mut w);
        w.into_bytes()
    }

    /// Transaction hash on the given network.
    pub fn hash(&self, network_passphrase: &str) -> TxHash {
        hash_transaction(&self.signature_payload(network_passphrase))
    }
}

impl ToXdr for TransactionEnvelope {
    fn write_xdr(&self, w: &mut XdrWriter) {
        self.source.write_xdr(w);
        w.write_u32(self.fee());
        w.write_i64(self.sequence);
        // PRECOND_TIME
        w.write_i32(1);
        self.time_bounds.write_xdr(w);
        // MEMO_NONE
        w.write_i32(0);
        w.write_len(self.operations.len());
        for op in &self.operations {
            op.write_xdr(w);
        }
        // ext v0
        w.write_i32(0);
    }
}

/// A signature together with the last four bytes of the signer's key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoratedSignature {
    pub hint: [u8; 4],
    pub signature: Signature,
}

impl ToXdr for DecoratedSignature {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_fixed(&self.hint);
        w.write_var(&self.signature.0);
    }
}

/// A signed transaction, ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub(crate) transaction: TransactionEnvelope,
    pub(crate) hash: TxHash,
    pub(crate) signatures: Vec<DecoratedSignature>,
}

impl SignedEnvelope {
    pub fn transaction(&self) -> &TransactionEnvelope {
        &self.transaction
    }

    /// Hash on the network the envelope was signed for.
    pub fn hash(&self) -> TxHash {
        self.hash
    }

    pub fn signatures(&self) -> &[DecoratedSignature] {
        &self.signatures
    }

    pub fn operation_count(&self) -> usize {
        self.transaction.operations.len()
    }

    /// Base64 of the envelope XDR, the form the ledger API accepts.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_xdr())
    }

    /// Whether the source account's signature validates on the network
    /// identified by `network_passphrase`.
    pub fn verify(&self, network_passphrase: &str) -> bool {
        let key = PublicKey(self.transaction.source.0);
        let hash = self.transaction.hash(network_passphrase);
        self.signatures
            .iter()
            .filter(|s| s.hint == key.hint())
            .any(|s| verify_signature(hash.as_bytes(), &s.signature, &key))
    }
}

impl ToXdr for SignedEnvelope {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_i32(ENVELOPE_TYPE_TX);
        self.transaction.write_xdr(w);
        w.write_len(self.signatures.len());
        for sig in &self.signatures {
            sig.write_xdr(w);
        }
    }
}
