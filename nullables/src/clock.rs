//! Nullable clock: time only moves when a test moves it.

use std::sync::atomic::{AtomicU64, Ordering};

use custody_types::Timestamp;
use custody_wallet_core::Clock;

pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.current.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, secs: u64) {
        self.current.store(secs, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_on_request() {
        let clock = NullClock::new(1_000);
        assert_eq!(clock.now().as_secs(), 1_000);
        clock.advance(61);
        assert_eq!(clock.now().as_secs(), 1_061);
        clock.set(5);
        assert_eq!(clock.now(), Timestamp::new(5));
    }
}
