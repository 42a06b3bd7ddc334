use rust_decimal::Decimal;

use crate::core::money::{ensure_storable, round_for_storage, STORAGE_SCALE};
use crate::core::{AppError, Percent, Result};
use crate::modules::totals::models::{DocumentTotals, LineItem};

/// TotalsCalculator derives subtotal, discount, tax and grand total for a document.
///
/// Pure and stateless: the same inputs always give the same outputs. Each
/// derived amount is rounded once to the storage scale (6 dp), so a reloaded
/// document recomputes to exactly what was saved. Rounding to cents happens
/// only when amounts are presented.
pub struct TotalsCalculator;

impl TotalsCalculator {
    /// Compute document totals
    ///
    /// subtotal      = Σ(quantity × unit_price) over items with quantity > 0 and unit_price > 0
    /// discount      = subtotal × discount% / 100
    /// taxable_base  = subtotal − discount
    /// tax           = taxable_base × tax_rate% / 100
    /// total         = taxable_base + tax
    ///
    /// Rates are range-checked by `Percent`, the calculator does not clamp.
    /// Amounts too large for the money columns are a validation error.
    pub fn compute(
        items: &[LineItem],
        discount_percent: Percent,
        tax_rate: Percent,
    ) -> Result<DocumentTotals> {
        let subtotal = items
            .iter()
            .filter(|item| item.is_billable())
            .try_fold(Decimal::ZERO, |acc, item| {
                item.total().and_then(|line| acc.checked_add(line))
            })
            .map(round_for_storage)
            .ok_or_else(Self::overflow)?;
        ensure_storable(subtotal, STORAGE_SCALE, "Subtotal")?;

        let discount_amount = discount_percent
            .of(subtotal)
            .map(round_for_storage)
            .ok_or_else(Self::overflow)?;
        let taxable_base = subtotal - discount_amount;
        let tax_amount = tax_rate
            .of(taxable_base)
            .map(round_for_storage)
            .ok_or_else(Self::overflow)?;
        let total = taxable_base + tax_amount;
        ensure_storable(total, STORAGE_SCALE, "Total")?;

        Ok(DocumentTotals {
            subtotal,
            discount_amount,
            taxable_base,
            tax_amount,
            total,
        })
    }

    fn overflow() -> AppError {
        AppError::validation("Document amounts exceed the maximum supported amount")
    }
}
