//! Decimal money helpers.
//!
//! All monetary values in Tamarind are `rust_decimal::Decimal`, never binary
//! floating point. Totals are exact sums of `unit price x quantity`; the only
//! tolerance in the system is the comparison against a client-supplied total,
//! which allows [`AMOUNT_EPSILON`] of decimal rounding drift.

use rust_decimal::Decimal;

/// Maximum difference tolerated between a client-claimed total and the
/// server-computed total: 0.01 currency unit.
///
/// A mismatch beyond this is a hard rejection (the client's view of the cart
/// is stale), not a recompute-and-proceed.
pub const AMOUNT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Compare two monetary amounts within [`AMOUNT_EPSILON`].
#[must_use]
pub fn amounts_match(expected: Decimal, claimed: Decimal) -> bool {
    (expected - claimed).abs() <= AMOUNT_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_epsilon_is_one_cent() {
        assert_eq!(AMOUNT_EPSILON, dec!(0.01));
    }

    #[test]
    fn test_exact_amounts_match() {
        assert!(amounts_match(dec!(20000), dec!(20000)));
        assert!(amounts_match(dec!(19.99), dec!(19.99)));
    }

    #[test]
    fn test_rounding_drift_tolerated() {
        assert!(amounts_match(dec!(19.99), dec!(20.00)));
        assert!(amounts_match(dec!(20.00), dec!(19.99)));
    }

    #[test]
    fn test_real_mismatch_rejected() {
        assert!(!amounts_match(dec!(20000), dec!(19999)));
        assert!(!amounts_match(dec!(19.99), dec!(20.01)));
    }
}
