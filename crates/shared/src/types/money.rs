//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount in the system is a `rust_decimal::Decimal` rounded to cents
//! with round-half-up before it is compared or persisted.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept for every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Maximum drift tolerated when checking `paid + pending == total`.
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds an amount to cents using round-half-up (away from zero on a tie).
///
/// The result always carries exactly two decimal places.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Returns true if `a` and `b` differ by no more than [`MONEY_TOLERANCE`].
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= MONEY_TOLERANCE
}
