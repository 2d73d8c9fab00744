use proptest::prelude::*;

use custody_types::{Amount, Timestamp, TxHash};

proptest! {
    /// Display output always parses back to the same amount.
    #[test]
    fn amount_display_parses_back(stroops in 0u64..=i64::MAX as u64) {
        let amount = Amount::new(stroops);
        let rendered = amount.to_string();
        prop_assert_eq!(Amount::parse(&rendered).unwrap(), amount);
    }

    /// Display never emits trailing fractional zeros or more than 7 decimals.
    #[test]
    fn amount_display_is_canonical(stroops in 0u64..=i64::MAX as u64) {
        let rendered = Amount::new(stroops).to_string();
        if let Some((_, frac)) = rendered.split_once('.') {
            prop_assert!(!frac.is_empty() && frac.len() <= 7);
            prop_assert!(!frac.ends_with('0'));
        }
    }

    /// Subtraction is exact and refuses to go below zero.
    #[test]
    fn amount_checked_sub_is_exact(a in 0u64..1_000_000_000_000, b in 0u64..1_000_000_000_000) {
        let result = Amount::new(a).checked_sub(Amount::new(b));
        if a >= b {
            prop_assert_eq!(result, Some(Amount::new(a - b)));
        } else {
            prop_assert_eq!(result, None);
        }
    }

    /// Whole-unit strings with up to 7 fractional digits scale exactly.
    #[test]
    fn amount_parse_scales_by_ten_million(whole in 0u64..900_000_000_000, frac in 0u64..10_000_000) {
        let input = format!("{whole}.{frac:07}");
        let parsed = Amount::parse(&input).unwrap();
        prop_assert_eq!(parsed.stroops(), whole * 10_000_000 + frac);
    }

    /// TxHash::is_zero is true only for all-zero bytes.
    #[test]
    fn tx_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = TxHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// TxHash hex form is 64 lowercase characters.
    #[test]
    fn tx_hash_hex_shape(bytes in prop::array::uniform32(0u8..)) {
        let hex = TxHash::new(bytes).to_hex();
        prop_assert_eq!(hex.len(), 64);
        prop_assert!(hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    /// Clock time is always a well-formed HH:MM:SS string.
    #[test]
    fn clock_time_shape(secs in 0u64..u64::MAX) {
        let clock = Timestamp::new(secs).clock_time();
        prop_assert_eq!(clock.len(), 8);
        let parts: Vec<u64> = clock.split(':').map(|p| p.parse().unwrap()).collect();
        prop_assert!(parts[0] < 24 && parts[1] < 60 && parts[2] < 60);
    }
}
