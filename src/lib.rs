//! BizLedger billing core
//!
//! Quote and invoice lifecycle, payment ledger and receivables reporting for
//! a multi-tenant business management application.

pub mod app;
pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use app::{configure, BillingServices};
pub use modules::invoices;
pub use modules::payments;
pub use modules::quotes;
pub use modules::totals;
