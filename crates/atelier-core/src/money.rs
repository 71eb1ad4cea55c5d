//! # Money Module
//!
//! Rounding, clamping and tolerant comparison for monetary values.
//!
//! ## Why Decimal, and Why Still Round?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE ROUNDING CHAIN                                                     │
//! │                                                                         │
//! │  component price / unit divisor      ──► round to cents                 │
//! │  price per metre / roll width        ──► round to cents                 │
//! │  cut area × waste × value per cm²    ──► round to cents                 │
//! │  Σ rows                              ──► round to cents                 │
//! │                                                                         │
//! │  Every stored figure is a cent amount. Decimal keeps each step exact;   │
//! │  the explicit rounding keeps results identical to what the workshop     │
//! │  has on paper. Comparisons still use a one-cent tolerance because a     │
//! │  sum of rounded parts may differ from the rounded whole.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use atelier_core::money::{approx_equal, clamp_non_negative, round_money};
//! use rust_decimal::Decimal;
//!
//! let value = Decimal::new(66667, 5); // 0.66667
//! assert_eq!(round_money(value), Decimal::new(67, 2));
//! assert_eq!(clamp_non_negative(Decimal::new(-5, 0)), Decimal::ZERO);
//! assert!(approx_equal(Decimal::new(1000, 2), Decimal::new(1001, 2) - Decimal::new(5, 3)));
//! ```

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

// =============================================================================
// Constants
// =============================================================================

/// Default tolerance for [`approx_equal`]: one cent.
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Decimal places kept for money.
pub const MONEY_DP: u32 = 2;

// =============================================================================
// Rounding
// =============================================================================

/// Rounds to `dp` decimal places, halves towards positive infinity.
///
/// `2.345 → 2.35` and `-2.345 → -2.34`, matching how cash registers and
/// spreadsheets in the shop round.
pub fn round_to(value: Decimal, dp: u32) -> Decimal {
    let strategy = if value.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    value.round_dp_with_strategy(dp, strategy)
}

/// Rounds a value to cents.
///
/// ## Example
/// ```rust
/// use atelier_core::money::round_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_money(Decimal::new(14745, 3)), Decimal::new(1475, 2));
/// ```
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    round_to(value, MONEY_DP)
}

/// Rounds a float coming from an untyped source. Non-finite input → 0.
pub fn round_money_f64(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value)
        .map(round_money)
        .unwrap_or(Decimal::ZERO)
}

/// Rounds to cents, then floors at zero.
#[inline]
pub fn clamp_non_negative(value: Decimal) -> Decimal {
    round_money(value).max(Decimal::ZERO)
}

// =============================================================================
// Overflow-Safe Arithmetic
// =============================================================================
//
// Legacy documents can carry absurd figures (a stray "1e17" quantity). The
// plain operators panic past ~7.9e28; these never do.

/// `a × b`, or 0 when the product does not fit in a Decimal.
#[inline]
pub fn mul_or_zero(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or(Decimal::ZERO)
}

/// `a ÷ b`, or 0 when `b` is zero or the quotient does not fit.
#[inline]
pub fn div_or_zero(a: Decimal, b: Decimal) -> Decimal {
    a.checked_div(b).unwrap_or(Decimal::ZERO)
}

/// Sum that saturates at the Decimal bounds.
pub fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, value| acc.saturating_add(value))
}

// =============================================================================
// Comparison
// =============================================================================

/// `|a − b| < 0.01`.
#[inline]
pub fn approx_equal(a: Decimal, b: Decimal) -> bool {
    approx_equal_within(a, b, MONEY_TOLERANCE)
}

/// `|a − b| < tolerance`.
#[inline]
pub fn approx_equal_within(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() < tolerance
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(num: i64, scale: u32) -> Decimal {
        Decimal::new(num, scale)
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(d(2345, 3)), d(235, 2));
        assert_eq!(round_money(d(2344, 3)), d(234, 2));
        assert_eq!(round_money(d(-2345, 3)), d(-234, 2));
        assert_eq!(round_money(d(-2346, 3)), d(-235, 2));
    }

    #[test]
    fn test_round_money_idempotent() {
        let samples = [
            d(0, 0),
            d(1, 3),
            d(66666, 5),
            d(-12345678, 6),
            d(999995, 5),
            d(14745, 3),
            Decimal::new(i64::MAX, 10),
        ];
        for value in samples {
            let once = round_money(value);
            assert_eq!(round_money(once), once, "not idempotent for {value}");
        }
    }

    #[test]
    fn test_round_money_f64_non_finite() {
        assert_eq!(round_money_f64(f64::NAN), Decimal::ZERO);
        assert_eq!(round_money_f64(f64::INFINITY), Decimal::ZERO);
        assert_eq!(round_money_f64(f64::NEG_INFINITY), Decimal::ZERO);
        assert_eq!(round_money_f64(1.125), d(113, 2));
        assert_eq!(round_money_f64(-3.5), d(-35, 1));
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(clamp_non_negative(d(-1, 2)), Decimal::ZERO);
        assert_eq!(clamp_non_negative(d(-4, 3)), Decimal::ZERO);
        assert_eq!(clamp_non_negative(d(12349, 3)), d(1235, 2));
    }

    #[test]
    fn test_overflow_safe_arithmetic() {
        let huge = Decimal::new(100_000_000_000_000_000, 0);
        assert_eq!(mul_or_zero(huge, huge), Decimal::ZERO);
        assert_eq!(mul_or_zero(d(15, 1), d(4, 0)), d(6, 0));
        assert_eq!(div_or_zero(d(1, 0), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(div_or_zero(d(10, 0), d(4, 0)), d(25, 1));
        assert_eq!(saturating_sum([Decimal::MAX, Decimal::MAX]), Decimal::MAX);
        assert_eq!(saturating_sum([d(1, 0), d(2, 0)]), d(3, 0));
    }

    #[test]
    fn test_approx_equal() {
        assert!(approx_equal(d(1000, 2), d(1000, 2)));
        assert!(approx_equal(d(1000, 2), d(10009, 3)));
        assert!(!approx_equal(d(1000, 2), d(1001, 2)));
        assert!(approx_equal_within(d(100, 0), d(105, 0), d(10, 0)));
    }
}
