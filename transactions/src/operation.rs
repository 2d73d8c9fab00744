//! Ledger operations.
//!
//! [`Operation`] is what callers hand to the builder: addresses and balance
//! ids as text, exactly as they arrive from users or from the ledger API.
//! The builder resolves each one into an [`OperationBody`], whose fields are
//! decoded keys and hashes ready for the wire.

use std::fmt;

use custody_crypto::{decode_address, derive_address};
use custody_types::{Amount, PublicKey, WalletAddress};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BuildError, XdrError};
use crate::xdr::{ToXdr, XdrReader, XdrWriter};

/// Maximum claimants on one claimable balance.
pub const MAX_CLAIMANTS: usize = 10;

/// An ed25519 account key as it appears on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn from_address(address: &str) -> Option<Self> {
        decode_address(address).map(Self)
    }

    pub fn address(&self) -> WalletAddress {
        derive_address(&PublicKey(self.0))
    }
}

impl From<&PublicKey> for AccountId {
    fn from(key: &PublicKey) -> Self {
        Self(key.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.address().as_str())
    }
}

impl ToXdr for AccountId {
    fn write_xdr(&self, w: &mut XdrWriter) {
        // PUBLIC_KEY_TYPE_ED25519 / KEY_TYPE_ED25519; the muxed and plain
        // account forms share this encoding.
        w.write_i32(0);
        w.write_fixed(&self.0);
    }
}

/// Identifier of a claimable balance: the 32-byte hash of the creating
/// operation. Rendered as 72 hex characters, the first eight being the
/// `00000000` type prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimableBalanceId(pub [u8; 32]);

impl ClaimableBalanceId {
    const TYPE_PREFIX: &'static str = "00000000";

    /// Parse the 72-character form. The bare 64-character hash is accepted too.
    pub fn parse(input: &str) -> Option<Self> {
        let hash_hex = match input.len() {
            72 => input.strip_prefix(Self::TYPE_PREFIX)?,
            64 => input,
            _ => return None,
        };
        let mut hash = [0u8; 32];
        hex::decode_to_slice(hash_hex, &mut hash).ok()?;
        Some(Self(hash))
    }

    pub(crate) fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        match r.read_i32()? {
            0 => Ok(Self(r.read_fixed()?)),
            value => Err(XdrError::InvalidDiscriminant {
                what: "claimable balance id",
                value,
            }),
        }
    }
}

impl fmt::Display for ClaimableBalanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::TYPE_PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for ClaimableBalanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimableBalanceId({self})")
    }
}

impl ToXdr for ClaimableBalanceId {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_i32(0);
        w.write_fixed(&self.0);
    }
}

/// An asset held on the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Asset {
    Native,
    AlphaNum4 { code: [u8; 4], issuer: AccountId },
    AlphaNum12 { code: [u8; 12], issuer: AccountId },
}

impl Asset {
    /// An issued asset. Codes of 1-4 characters are alphanum4, 5-12 alphanum12.
    pub fn credit(code: &str, issuer: &str) -> Result<Self, BuildError> {
        if code.is_empty() || code.len() > 12 || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(BuildError::InvalidAsset(format!("bad asset code {code:?}")));
        }
        let issuer = AccountId::from_address(issuer)
            .ok_or_else(|| BuildError::InvalidAsset(format!("bad issuer {issuer:?}")))?;

        if code.len() <= 4 {
            let mut padded = [0u8; 4];
            padded[..code.len()].copy_from_slice(code.as_bytes());
            Ok(Self::AlphaNum4 { code: padded, issuer })
        } else {
            let mut padded = [0u8; 12];
            padded[..code.len()].copy_from_slice(code.as_bytes());
            Ok(Self::AlphaNum12 { code: padded, issuer })
        }
    }

    /// Parse the ledger API's canonical form: `native` or `CODE:ISSUER`.
    pub fn from_canonical(input: &str) -> Result<Self, BuildError> {
        if input == "native" {
            return Ok(Self::Native);
        }
        let (code, issuer) = input
            .split_once(':')
            .ok_or_else(|| BuildError::InvalidAsset(input.to_string()))?;
        Self::credit(code, issuer)
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// Asset code with padding stripped; `None` for the native asset.
    pub fn code(&self) -> Option<&str> {
        let raw: &[u8] = match self {
            Self::Native => return None,
            Self::AlphaNum4 { code, .. } => code,
            Self::AlphaNum12 { code, .. } => code,
        };
        let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
        std::str::from_utf8(&raw[..end]).ok()
    }

    pub fn issuer(&self) -> Option<&AccountId> {
        match self {
            Self::Native => None,
            Self::AlphaNum4 { issuer, .. } | Self::AlphaNum12 { issuer, .. } => Some(issuer),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code(), self.issuer()) {
            (Some(code), Some(issuer)) => write!(f, "{code}:{issuer}"),
            _ => f.write_str("native"),
        }
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Asset::from_canonical(&raw).map_err(serde::de::Error::custom)
    }
}

impl ToXdr for Asset {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Native => w.write_i32(0),
            Self::AlphaNum4 { code, issuer } => {
                w.write_i32(1);
                w.write_fixed(code);
                issuer.write_xdr(w);
            }
            Self::AlphaNum12 { code, issuer } => {
                w.write_i32(2);
                w.write_fixed(code);
                issuer.write_xdr(w);
            }
        }
    }
}

/// Condition under which a claimant may claim a balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PredicateJson", into = "PredicateJson")]
pub enum ClaimPredicate {
    Unconditional,
    And(Box<ClaimPredicate>, Box<ClaimPredicate>),
    Or(Box<ClaimPredicate>, Box<ClaimPredicate>),
    Not(Box<ClaimPredicate>),
    /// Claimable while the ledger close time is before this unix time.
    BeforeAbsoluteTime(i64),
    /// Claimable for this many seconds after the balance was created.
    BeforeRelativeTime(i64),
}

impl ClaimPredicate {
    /// Claimable only once `unix_time` has passed.
    pub fn not_before(unix_time: i64) -> Self {
        Self::Not(Box::new(Self::BeforeAbsoluteTime(unix_time)))
    }

    /// Evaluate against a unix time.
    ///
    /// Relative predicates depend on the balance's creation time, which is
    /// not known here, so they evaluate to `None`.
    pub fn is_satisfied_at(&self, unix_time: i64) -> Option<bool> {
        match self {
            Self::Unconditional => Some(true),
            Self::And(a, b) => match (a.is_satisfied_at(unix_time), b.is_satisfied_at(unix_time)) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            Self::Or(a, b) => match (a.is_satisfied_at(unix_time), b.is_satisfied_at(unix_time)) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            Self::Not(inner) => inner.is_satisfied_at(unix_time).map(|v| !v),
            Self::BeforeAbsoluteTime(deadline) => Some(unix_time < *deadline),
            Self::BeforeRelativeTime(_) => None,
        }
    }
}

impl ToXdr for ClaimPredicate {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Unconditional => w.write_i32(0),
            Self::And(a, b) | Self::Or(a, b) => {
                w.write_i32(if matches!(self, Self::And(..)) { 1 } else { 2 });
                w.write_len(2);
                a.write_xdr(w);
                b.write_xdr(w);
            }
            Self::Not(inner) => {
                w.write_i32(3);
                w.write_bool(true);
                inner.write_xdr(w);
            }
            Self::BeforeAbsoluteTime(t) => {
                w.write_i32(4);
                w.write_i64(*t);
            }
            Self::BeforeRelativeTime(secs) => {
                w.write_i32(5);
                w.write_i64(*secs);
            }
        }
    }
}

/// Predicate shape used by the ledger's JSON API.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PredicateJson {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    unconditional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    and: Option<Vec<PredicateJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    or: Option<Vec<PredicateJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not: Option<Box<PredicateJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    abs_before_epoch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rel_before: Option<String>,
}

impl TryFrom<PredicateJson> for ClaimPredicate {
    type Error = String;

    fn try_from(json: PredicateJson) -> Result<Self, Self::Error> {
        fn pair(list: Vec<PredicateJson>) -> Result<(Box<ClaimPredicate>, Box<ClaimPredicate>), String> {
            let [a, b]: [PredicateJson; 2] = list
                .try_into()
                .map_err(|l: Vec<_>| format!("expected 2 predicates, found {}", l.len()))?;
            Ok((Box::new(a.try_into()?), Box::new(b.try_into()?)))
        }
        fn seconds(raw: &str) -> Result<i64, String> {
            raw.parse().map_err(|_| format!("invalid predicate time {raw:?}"))
        }

        if json.unconditional {
            Ok(Self::Unconditional)
        } else if let Some(list) = json.and {
            pair(list).map(|(a, b)| Self::And(a, b))
        } else if let Some(list) = json.or {
            pair(list).map(|(a, b)| Self::Or(a, b))
        } else if let Some(inner) = json.not {
            Ok(Self::Not(Box::new((*inner).try_into()?)))
        } else if let Some(epoch) = json.abs_before_epoch {
            seconds(&epoch).map(Self::BeforeAbsoluteTime)
        } else if let Some(rel) = json.rel_before {
            seconds(&rel).map(Self::BeforeRelativeTime)
        } else {
            Err("empty claim predicate".into())
        }
    }
}

impl From<ClaimPredicate> for PredicateJson {
    fn from(predicate: ClaimPredicate) -> Self {
        match predicate {
            ClaimPredicate::Unconditional => Self {
                unconditional: true,
                ..Self::default()
            },
            ClaimPredicate::And(a, b) => Self {
                and: Some(vec![(*a).into(), (*b).into()]),
                ..Self::default()
            },
            ClaimPredicate::Or(a, b) => Self {
                or: Some(vec![(*a).into(), (*b).into()]),
                ..Self::default()
            },
            ClaimPredicate::Not(inner) => Self {
                not: Some(Box::new((*inner).into())),
                ..Self::default()
            },
            ClaimPredicate::BeforeAbsoluteTime(t) => Self {
                abs_before_epoch: Some(t.to_string()),
                ..Self::default()
            },
            ClaimPredicate::BeforeRelativeTime(secs) => Self {
                rel_before: Some(secs.to_string()),
                ..Self::default()
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claimant {
    pub destination: String,
    pub predicate: ClaimPredicate,
}

/// The operation kinds this backend builds and decodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Payment,
    CreateClaimableBalance,
    ClaimClaimableBalance,
}

impl OperationKind {
    pub const fn type_code(self) -> i32 {
        match self {
            Self::Payment => 1,
            Self::CreateClaimableBalance => 14,
            Self::ClaimClaimableBalance => 15,
        }
    }

    pub fn from_type_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Payment),
            14 => Some(Self::CreateClaimableBalance),
            15 => Some(Self::ClaimClaimableBalance),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        operation_type_name(self.type_code())
    }
}

/// Name of any ledger operation type code, including ones this backend
/// never builds.
pub fn operation_type_name(code: i32) -> &'static str {
    const NAMES: [&str; 27] = [
        "create_account",
        "payment",
        "path_payment_strict_receive",
        "manage_sell_offer",
        "create_passive_sell_offer",
        "set_options",
        "change_trust",
        "allow_trust",
        "account_merge",
        "inflation",
        "manage_data",
        "bump_sequence",
        "manage_buy_offer",
        "path_payment_strict_send",
        "create_claimable_balance",
        "claim_claimable_balance",
        "begin_sponsoring_future_reserves",
        "end_sponsoring_future_reserves",
        "revoke_sponsorship",
        "clawback",
        "clawback_claimable_balance",
        "set_trust_line_flags",
        "liquidity_pool_deposit",
        "liquidity_pool_withdraw",
        "invoke_host_function",
        "extend_footprint_ttl",
        "restore_footprint",
    ];
    usize::try_from(code)
        .ok()
        .and_then(|i| NAMES.get(i).copied())
        .unwrap_or("unknown")
}

/// An operation as requested by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Payment {
        destination: String,
        asset: Asset,
        amount: Amount,
    },
    ClaimClaimableBalance {
        balance_id: String,
    },
    CreateClaimableBalance {
        asset: Asset,
        amount: Amount,
        claimants: Vec<Claimant>,
    },
}

impl Operation {
    /// Native-asset payment.
    pub fn payment(destination: impl Into<String>, amount: Amount) -> Self {
        Self::Payment {
            destination: destination.into(),
            asset: Asset::Native,
            amount,
        }
    }

    pub fn claim(balance_id: impl Into<String>) -> Self {
        Self::ClaimClaimableBalance {
            balance_id: balance_id.into(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Payment { .. } => OperationKind::Payment,
            Self::ClaimClaimableBalance { .. } => OperationKind::ClaimClaimableBalance,
            Self::CreateClaimableBalance { .. } => OperationKind::CreateClaimableBalance,
        }
    }

    /// Validate the textual fields and decode them for the wire.
    pub(crate) fn resolve(&self, index: usize) -> Result<OperationBody, BuildError> {
        let account = |field: &'static str, address: &str| {
            if address.is_empty() {
                return Err(BuildError::MissingField { index, field });
            }
            AccountId::from_address(address).ok_or_else(|| BuildError::InvalidAddress {
                field,
                address: address.to_string(),
            })
        };
        let positive = |amount: &Amount| {
            if amount.is_zero() {
                Err(BuildError::InvalidAmount { index })
            } else {
                Ok(*amount)
            }
        };

        match self {
            Self::Payment {
                destination,
                asset,
                amount,
            } => Ok(OperationBody::Payment {
                destination: account("destination", destination)?,
                asset: asset.clone(),
                amount: positive(amount)?,
            }),
            Self::ClaimClaimableBalance { balance_id } => {
                if balance_id.is_empty() {
                    return Err(BuildError::MissingField {
                        index,
                        field: "balance_id",
                    });
                }
                let balance_id =
                    ClaimableBalanceId::parse(balance_id).ok_or_else(|| BuildError::InvalidBalanceId {
                        index,
                        id: balance_id.clone(),
                    })?;
                Ok(OperationBody::ClaimClaimableBalance { balance_id })
            }
            Self::CreateClaimableBalance {
                asset,
                amount,
                claimants,
            } => {
                if claimants.is_empty() {
                    return Err(BuildError::MissingField {
                        index,
                        field: "claimants",
                    });
                }
                if claimants.len() > MAX_CLAIMANTS {
                    return Err(BuildError::TooManyClaimants {
                        index,
                        count: claimants.len(),
                        max: MAX_CLAIMANTS,
                    });
                }
                let claimants = claimants
                    .iter()
                    .map(|c| Ok((account("claimant", &c.destination)?, c.predicate.clone())))
                    .collect::<Result<Vec<_>, BuildError>>()?;
                Ok(OperationBody::CreateClaimableBalance {
                    asset: asset.clone(),
                    amount: positive(amount)?,
                    claimants,
                })
            }
        }
    }
}

/// A validated operation, ready to encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationBody {
    Payment {
        destination: AccountId,
        asset: Asset,
        amount: Amount,
    },
    ClaimClaimableBalance {
        balance_id: ClaimableBalanceId,
    },
    CreateClaimableBalance {
        asset: Asset,
        amount: Amount,
        claimants: Vec<(AccountId, ClaimPredicate)>,
    },
}

impl OperationBody {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Payment { .. } => OperationKind::Payment,
            Self::ClaimClaimableBalance { .. } => OperationKind::ClaimClaimableBalance,
            Self::CreateClaimableBalance { .. } => OperationKind::CreateClaimableBalance,
        }
    }
}

impl ToXdr for OperationBody {
    fn write_xdr(&self, w: &mut XdrWriter) {
        // No per-operation source account: the transaction source applies.
        w.write_bool(false);
        w.write_i32(self.kind().type_code());
        match self {
            Self::Payment {
                destination,
                asset,
                amount,
            } => {
                destination.write_xdr(w);
                asset.write_xdr(w);
                w.write_i64(amount.to_wire());
            }
            Self::ClaimClaimableBalance { balance_id } => balance_id.write_xdr(w),
            Self::CreateClaimableBalance {
                asset,
                amount,
                claimants,
            } => {
                asset.write_xdr(w);
                w.write_i64(amount.to_wire());
                w.write_len(claimants.len());
                for (destination, predicate) in claimants {
                    // CLAIMANT_TYPE_V0
                    w.write_i32(0);
                    destination.write_xdr(w);
                    predicate.write_xdr(w);
                }
            }
        }
    }
}
