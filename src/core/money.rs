use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{AppError, Result};

/// Decimal places shown to callers
pub const DISPLAY_SCALE: u32 = 2;

/// Decimal places of the money, quantity and price columns (DECIMAL(19,6))
pub const STORAGE_SCALE: u32 = 6;

/// Decimal places of the rate columns (DECIMAL(9,4))
pub const RATE_SCALE: u32 = 4;

/// Largest amount a DECIMAL(19,6) column holds
pub fn max_amount() -> Decimal {
    Decimal::from_i128_with_scale(9_999_999_999_999_999_999, STORAGE_SCALE)
}

/// Slack allowed when a payment slightly exceeds the exact balance
/// (an amount typed from a rounded balance label, e.g. 5.005 vs 5.00).
pub fn payment_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

/// Rounds an amount for presentation (half away from zero)
pub fn round_for_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a computed amount to the scale it is stored at (half away from zero)
pub fn round_for_storage(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(STORAGE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rejects values that would not survive a trip through a column with
/// `scale` decimal places and the DECIMAL(19,6) integer range.
pub fn ensure_storable(value: Decimal, scale: u32, field: &str) -> Result<()> {
    if value.normalize().scale() > scale {
        return Err(AppError::validation(format!(
            "{} cannot have more than {} decimal places, got: {}",
            field, scale, value
        )));
    }

    if value.abs() > max_amount() {
        return Err(AppError::validation(format!(
            "{} exceeds the maximum supported amount of {}",
            field,
            max_amount()
        )));
    }

    Ok(())
}

/// Formats an amount with exactly two decimal places
pub fn format_amount(amount: Decimal) -> String {
    format!(
        "{:.width$}",
        round_for_display(amount),
        width = DISPLAY_SCALE as usize
    )
}

/// A percentage in the closed range [0, 100].
///
/// Discount and tax rates are validated when the value is built, so the
/// totals calculator never sees an out-of-range rate and never clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percent(Decimal);

impl Percent {
    pub const ZERO: Percent = Percent(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(AppError::validation(format!(
                "Percentage must be between 0 and 100, got: {}",
                value
            )));
        }

        if value.normalize().scale() > RATE_SCALE {
            return Err(AppError::validation(format!(
                "Percentage cannot have more than {} decimal places, got: {}",
                RATE_SCALE, value
            )));
        }

        Ok(Self(value.normalize()))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// `amount × percent / 100`, unrounded. `None` on overflow.
    pub fn of(&self, amount: Decimal) -> Option<Decimal> {
        amount.checked_mul(self.0 / Decimal::ONE_HUNDRED)
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = AppError;

    fn try_from(value: Decimal) -> Result<Self> {
        Percent::new(value)
    }
}

impl From<Percent> for Decimal {
    fn from(percent: Percent) -> Self {
        percent.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
