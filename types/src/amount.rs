//! Fixed-point ledger amounts.
//!
//! The ledger carries amounts as signed 64-bit integers of stroops, with
//! 7 decimal places per unit. Amounts are never negative, so the value is
//! stored as a `u64` bounded by `i64::MAX` to keep the wire form lossless.
//! Parsing is exact: no floating point is involved anywhere.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// A non-negative ledger amount in stroops (1 unit = 10^7 stroops).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Number of decimal places in the textual form.
    pub const DECIMALS: u32 = 7;

    /// Stroops per whole unit.
    pub const STROOPS_PER_UNIT: u64 = 10_000_000;

    /// Largest representable amount (the ledger's `int64` ceiling).
    pub const MAX: Self = Self(i64::MAX as u64);

    /// Create an amount from raw stroops.
    ///
    /// # Panics
    /// Panics if `stroops` exceeds `i64::MAX`. In const contexts this is a
    /// compile-time error.
    pub const fn new(stroops: u64) -> Self {
        assert!(stroops <= i64::MAX as u64, "amount exceeds int64 range");
        Self(stroops)
    }

    /// Create an amount from the ledger's signed wire value.
    ///
    /// Returns `None` for negative values.
    pub fn from_wire(stroops: i64) -> Option<Self> {
        u64::try_from(stroops).ok().map(Self)
    }

    /// Raw stroops.
    pub const fn stroops(&self) -> u64 {
        self.0
    }

    /// Signed wire value. Always non-negative.
    pub const fn to_wire(&self) -> i64 {
        self.0 as i64
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0
            .checked_add(other.0)
            .filter(|v| *v <= Self::MAX.0)
            .map(Self)
    }

    /// Subtract, returning `None` when the result would be negative.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Parse a non-negative decimal string such as `"10"`, `"10.00"` or `".5"`.
    ///
    /// More than [`Amount::DECIMALS`] fractional digits is an error rather than
    /// a silent rounding.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::EmptyAmount);
        }
        if input.starts_with('-') {
            return Err(ParseError::NegativeAmount(input.to_string()));
        }

        let (whole, frac) = match input.split_once('.') {
            Some((w, f)) => (w, f),
            None => (input, ""),
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(ParseError::InvalidAmount(input.to_string()));
        }
        if frac.len() > Self::DECIMALS as usize {
            return Err(ParseError::TooPrecise {
                input: input.to_string(),
                max: Self::DECIMALS,
            });
        }

        let overflow = || ParseError::AmountOverflow(input.to_string());

        let whole_value: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };

        let mut frac_value: u64 = 0;
        for (i, b) in frac.bytes().enumerate() {
            let digit = u64::from(b - b'0');
            frac_value += digit * 10u64.pow(Self::DECIMALS - 1 - i as u32);
        }

        let stroops = whole_value
            .checked_mul(Self::STROOPS_PER_UNIT)
            .and_then(|v| v.checked_add(frac_value))
            .filter(|v| *v <= Self::MAX.0)
            .ok_or_else(overflow)?;

        Ok(Self(stroops))
    }
}

impl FromStr for Amount {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Renders the shortest exact decimal form: `9.99`, `10`, `0.0000001`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::STROOPS_PER_UNIT;
        let frac = self.0 % Self::STROOPS_PER_UNIT;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{:07}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Amount::parse(&raw).map_err(serde::de::Error::custom)
    }
}
