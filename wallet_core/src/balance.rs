//! Fee constants and payout arithmetic.

use custody_types::Amount;

use crate::error::WalletError;

/// Withheld from every withdrawal to cover the network fee: 0.01.
pub const WITHDRAWAL_FEE_RESERVE: Amount = Amount::new(100_000);

/// Per-operation fee offered on every transaction, in stroops (0.1).
pub const BASE_FEE: u32 = 1_000_000;

/// The amount actually paid out for a withdrawal request.
///
/// `requested` is the balance being claimed, as a decimal string. The
/// result is `requested - WITHDRAWAL_FEE_RESERVE` and must be positive.
pub fn net_withdrawal_amount(requested: &str) -> Result<Amount, WalletError> {
    let requested = Amount::parse(requested.trim())?;
    match requested.checked_sub(WITHDRAWAL_FEE_RESERVE) {
        Some(net) if !net.is_zero() => Ok(net),
        _ => Err(WalletError::InvalidAmount(format!(
            "{requested} does not exceed the fee reserve of {WITHDRAWAL_FEE_RESERVE}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_units_pay_out_nine_ninety_nine() {
        let net = net_withdrawal_amount("10.00").unwrap();
        assert_eq!(net.to_string(), "9.99");
        assert_eq!(net.stroops(), 99_900_000);
    }

    #[test]
    fn smallest_payout_is_one_stroop() {
        assert_eq!(net_withdrawal_amount("0.0100001").unwrap(), Amount::new(1));
    }

    #[test]
    fn amounts_not_above_reserve_rejected() {
        assert!(matches!(net_withdrawal_amount("0.01"), Err(WalletError::InvalidAmount(_))));
        assert!(matches!(net_withdrawal_amount("0.005"), Err(WalletError::InvalidAmount(_))));
        assert!(matches!(net_withdrawal_amount("0"), Err(WalletError::InvalidAmount(_))));
    }

    #[test]
    fn malformed_amounts_rejected() {
        for input in ["", "-5", "ten", "1e3", "1.123456789"] {
            assert!(
                matches!(net_withdrawal_amount(input), Err(WalletError::InvalidAmount(_))),
                "{input:?} should be rejected"
            );
        }
    }
}
