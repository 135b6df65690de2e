//! Money helpers
//!
//! All monetary maths in this crate runs at full decimal precision;
//! rounding to cents happens only at the presentation boundary
//! (rendered bills, persisted order snapshots).

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso::Currency};

/// Returns a zero amount in the given currency.
#[must_use]
pub fn zero(currency: &Currency) -> Money<'_, Currency> {
    Money::from_minor(0, currency)
}

/// Rounds a monetary amount to cents (two decimal places, midpoint away
/// from zero).
#[must_use]
pub fn round_to_cents<'a>(money: &Money<'a, Currency>) -> Money<'a, Currency> {
    let rounded = money
        .amount()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Money::from_decimal(rounded, money.currency())
}

/// Calculates the given percentage of an amount, at full precision.
#[must_use]
pub fn percent_of<'a>(money: &Money<'a, Currency>, percent: Percentage) -> Money<'a, Currency> {
    Money::from_decimal(percent * *money.amount(), money.currency())
}

/// Multiplies an amount by a whole quantity.
///
/// Returns `None` if the multiplication overflows the decimal range.
#[must_use]
pub fn times<'a>(money: &Money<'a, Currency>, quantity: u32) -> Option<Money<'a, Currency>> {
    let amount = money.amount().checked_mul(Decimal::from(quantity))?;

    Some(Money::from_decimal(amount, money.currency()))
}
