pub mod invoice_repository;

pub use invoice_repository::{
    InvoiceChange, InvoiceFilter, InvoiceGuard, InvoiceRepository, MySqlInvoiceRepository,
};
