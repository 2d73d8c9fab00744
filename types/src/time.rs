//! Timestamp type used for claim predicates and response stamps.
//!
//! Timestamps are Unix epoch seconds (UTC), matching the ledger's
//! `TimePoint` representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    ///
    /// A clock set before the epoch reads as [`Timestamp::EPOCH`].
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by `secs`, saturating.
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Wall-clock time of day in UTC, formatted `HH:MM:SS`.
    pub fn clock_time(&self) -> String {
        let day_secs = self.0 % 86_400;
        format!(
            "{:02}:{:02}:{:02}",
            day_secs / 3600,
            (day_secs % 3600) / 60,
            day_secs % 60
        )
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
