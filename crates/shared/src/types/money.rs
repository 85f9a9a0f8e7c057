//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal` in the school's single operating currency.

use rust_decimal::{Decimal, RoundingStrategy};

/// Default tolerance used when comparing debit and credit totals (0.01).
pub const DEFAULT_BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Decimal places stored for every amount.
pub const MONEY_SCALE: u32 = 2;

/// Returns true if `amount` fits in whole cents.
///
/// Trailing zeros do not count, so `10.500` is accepted.
#[must_use]
pub fn is_whole_cents(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE
}

/// Rounds an amount to two decimal places using Banker's Rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns true if `a` and `b` differ by no more than `tolerance`.
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_tolerance_is_one_cent() {
        assert_eq!(DEFAULT_BALANCE_TOLERANCE, dec!(0.01));
    }

    #[test]
    fn test_round_money_bankers() {
        assert_eq!(round_money(dec!(10.005)), dec!(10.00));
        assert_eq!(round_money(dec!(10.015)), dec!(10.02));
        assert_eq!(round_money(dec!(10.1234)), dec!(10.12));
    }

    #[test]
    fn test_is_whole_cents() {
        assert!(is_whole_cents(dec!(33500)));
        assert!(is_whole_cents(dec!(9.99)));
        assert!(is_whole_cents(dec!(10.500)));
        assert!(!is_whole_cents(dec!(9.995)));
        assert!(!is_whole_cents(dec!(0.004)));
    }

    #[test]
    fn test_within_tolerance() {
        assert!(within_tolerance(dec!(100.00), dec!(100.00), dec!(0.01)));
        assert!(within_tolerance(dec!(100.00), dec!(100.01), dec!(0.01)));
        assert!(within_tolerance(dec!(100.01), dec!(100.00), dec!(0.01)));
        assert!(!within_tolerance(dec!(500), dec!(300), dec!(0.01)));
        assert!(!within_tolerance(dec!(100.00), dec!(100.02), dec!(0.01)));
    }
}
