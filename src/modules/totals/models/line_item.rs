// Line items shared by quotes and invoices.
//
// A line item is a single product or service row. Its total is always
// derived (quantity × unit_price) and never stored independently.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::money::{ensure_storable, STORAGE_SCALE};
use crate::core::{AppError, Result};

const MAX_DESCRIPTION_LEN: usize = 255;

/// A validated line item attached to a quote or invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Description of the product or service
    pub description: String,

    /// Quantity, may be fractional (hours, meters)
    pub quantity: Decimal,

    /// Price per unit
    pub unit_price: Decimal,
}

/// Line item as submitted by a caller, before validation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LineItemInput {
    #[serde(default)]
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl LineItem {
    /// Create a new line item with validation
    ///
    /// # Arguments
    /// * `description` - Product/service description (max 255 chars)
    /// * `quantity` - Must be positive, at most 6 decimal places
    /// * `unit_price` - Must be positive, at most 6 decimal places
    pub fn new(description: String, quantity: Decimal, unit_price: Decimal) -> Result<Self> {
        Self::validate_description(&description)?;
        Self::validate_quantity(quantity)?;
        Self::validate_unit_price(unit_price)?;

        Ok(Self {
            description: description.trim().to_string(),
            quantity,
            unit_price,
        })
    }

    /// quantity × unit_price, unrounded. `None` on overflow, which only
    /// rows built without `LineItem::new` can reach.
    pub fn total(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }

    /// Whether this item takes part in the document totals
    pub fn is_billable(&self) -> bool {
        self.quantity > Decimal::ZERO && self.unit_price > Decimal::ZERO
    }

    fn validate_description(description: &str) -> Result<()> {
        if description.trim().is_empty() {
            return Err(AppError::validation(
                "Line item description cannot be empty",
            ));
        }

        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(AppError::validation(
                "Line item description cannot exceed 255 characters",
            ));
        }

        Ok(())
    }

    fn validate_quantity(quantity: Decimal) -> Result<()> {
        if quantity <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Quantity must be greater than 0, got: {}",
                quantity
            )));
        }

        ensure_storable(quantity, STORAGE_SCALE, "Quantity")
    }

    fn validate_unit_price(unit_price: Decimal) -> Result<()> {
        if unit_price <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Unit price must be greater than 0, got: {}",
                unit_price
            )));
        }

        ensure_storable(unit_price, STORAGE_SCALE, "Unit price")
    }
}

impl LineItemInput {
    /// Placeholder rows (zero quantity or zero price) left over from the
    /// editing form. They are dropped, not rejected.
    fn is_blank(&self) -> bool {
        self.quantity.is_zero() || self.unit_price.is_zero()
    }
}

/// Turn submitted rows into line items fit for persistence.
///
/// Blank rows are pruned. Negative values or a missing description on a
/// non-blank row reject the whole document, as does a document left with
/// no items at all.
pub fn prepare_line_items(inputs: Vec<LineItemInput>) -> Result<Vec<LineItem>> {
    let mut items = Vec::with_capacity(inputs.len());

    for (idx, input) in inputs.into_iter().enumerate() {
        if input.quantity < Decimal::ZERO || input.unit_price < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Line item {} has a negative quantity or unit price",
                idx + 1
            )));
        }

        if input.is_blank() {
            continue;
        }

        let item = LineItem::new(input.description, input.quantity, input.unit_price)
            .map_err(|e| match e {
                AppError::Validation(msg) => {
                    AppError::Validation(format!("Line item {}: {}", idx + 1, msg))
                }
                other => other,
            })?;
        items.push(item);
    }

    if items.is_empty() {
        return Err(AppError::validation(
            "At least one line item with quantity and unit price greater than 0 is required",
        ));
    }

    Ok(items)
}
