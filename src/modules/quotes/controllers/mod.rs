pub mod quote_controller;

pub use quote_controller::{configure, QuoteResponse};
