use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::line_item::LineItem;
use crate::core::{AppError, Percent, Result};
use crate::modules::totals::services::TotalsCalculator;

/// Derived amounts of a quote or invoice, at the storage scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// Σ(quantity × unit_price) over billable items
    pub subtotal: Decimal,
    /// subtotal × discount% / 100
    pub discount_amount: Decimal,
    /// subtotal − discount_amount
    pub taxable_base: Decimal,
    /// taxable_base × tax_rate% / 100
    pub tax_amount: Decimal,
    /// taxable_base + tax_amount
    pub total: Decimal,
}

/// Partial update of a document's items or rates
#[derive(Debug, Clone, Default)]
pub struct PricingChanges {
    pub items: Option<Vec<LineItem>>,
    pub discount_percent: Option<Percent>,
    pub tax_rate: Option<Percent>,
}

impl PricingChanges {
    pub fn is_empty(&self) -> bool {
        self.items.is_none() && self.discount_percent.is_none() && self.tax_rate.is_none()
    }
}

/// Items and rates of a document together with the totals derived from them.
///
/// The only way to change items or rates is through `Pricing::new`, so the
/// stored totals can never drift from the inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pricing {
    items: Vec<LineItem>,
    discount_percent: Percent,
    tax_rate: Percent,
    totals: DocumentTotals,
}

impl Pricing {
    pub fn new(items: Vec<LineItem>, discount_percent: Percent, tax_rate: Percent) -> Result<Self> {
        if !items.iter().any(LineItem::is_billable) {
            return Err(AppError::validation(
                "At least one line item with quantity and unit price greater than 0 is required",
            ));
        }

        let totals = TotalsCalculator::compute(&items, discount_percent, tax_rate)?;

        Ok(Self {
            items,
            discount_percent,
            tax_rate,
            totals,
        })
    }

    /// Apply a partial change, recomputing totals from scratch
    pub fn apply(&self, changes: PricingChanges) -> Result<Self> {
        Self::new(
            changes.items.unwrap_or_else(|| self.items.clone()),
            changes.discount_percent.unwrap_or(self.discount_percent),
            changes.tax_rate.unwrap_or(self.tax_rate),
        )
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn discount_percent(&self) -> Percent {
        self.discount_percent
    }

    pub fn tax_rate(&self) -> Percent {
        self.tax_rate
    }

    pub fn totals(&self) -> &DocumentTotals {
        &self.totals
    }

    pub fn total(&self) -> Decimal {
        self.totals.total
    }
}
