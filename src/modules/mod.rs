pub mod health;
pub mod invoices;
pub mod notifications;
pub mod payments;
pub mod quotes;
pub mod reports;
pub mod totals;
