// Quotes module: quote lifecycle, duplication and conversion to invoices

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Quote, QuoteStatus};
pub use repositories::{MySqlQuoteRepository, QuoteRepository};
pub use services::QuoteService;
