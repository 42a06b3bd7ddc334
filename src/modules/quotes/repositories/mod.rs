pub mod quote_repository;

pub use quote_repository::{
    MySqlQuoteRepository, QuoteChange, QuoteFilter, QuoteGuard, QuoteRepository,
};
