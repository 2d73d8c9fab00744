#![no_main]

use custody_crypto::{decode_address, decode_secret_seed};
use custody_transactions::ClaimableBalanceId;
use custody_types::Amount;
use libfuzzer_sys::fuzz_target;

// User-supplied strings from request bodies: none of these parsers may
// panic, and accepted amounts must print back to themselves.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = decode_address(text);
    let _ = decode_secret_seed(text);
    let _ = ClaimableBalanceId::parse(text);

    if let Ok(amount) = Amount::parse(text) {
        assert_eq!(Amount::parse(&amount.to_string()), Ok(amount));
    }
});
