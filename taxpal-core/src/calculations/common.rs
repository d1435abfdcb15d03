//! Rounding and ratio helpers shared by every calculator.
//!
//! All money figures leave the engine rounded half-up to cents, and every
//! percentage is computed through [`percent_of`] or [`percent_change`] so a
//! zero denominator yields `0` instead of a division panic.

use rust_decimal::{Decimal, RoundingStrategy};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use taxpal_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(4741.125)), dec!(4741.13));
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the larger of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Returns the smaller of two decimal values.
pub fn min(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a < b { a } else { b }
}

/// `part / whole × 100`, rounded to two places; `0` when `whole` is zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use taxpal_core::calculations::common::percent_of;
///
/// assert_eq!(percent_of(dec!(18964.50), dec!(80000)), dec!(23.71));
/// assert_eq!(percent_of(dec!(10), dec!(0)), dec!(0));
/// ```
pub fn percent_of(
    part: Decimal,
    whole: Decimal,
) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    round_half_up(part / whole * ONE_HUNDRED)
}

/// Percentage change from `previous` to `current`, rounded to two places.
///
/// Returns `0` when `previous` is zero or negative. A year that closed at a
/// net loss therefore reports no net-income change rather than a sign-flipped
/// ratio.
pub fn percent_change(
    current: Decimal,
    previous: Decimal,
) -> Decimal {
    if previous <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_half_up((current - previous) / previous * ONE_HUNDRED)
}

/// Sum of `values`, or `None` if the total does not fit in a [`Decimal`].
pub fn checked_total(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(value))
}
