// Totals module: line items and the totals calculator shared by quotes and invoices

pub mod controllers;
pub mod models;
pub mod services;

pub use models::{prepare_line_items, DocumentTotals, LineItem, LineItemInput, Pricing, PricingChanges};
pub use services::TotalsCalculator;
