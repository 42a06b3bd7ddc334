mod line_item;
mod totals;

pub use line_item::{prepare_line_items, LineItem, LineItemInput};
pub use totals::{DocumentTotals, Pricing, PricingChanges};
