pub mod invoice_service;
pub mod overdue_classifier;

pub use invoice_service::{InvoiceService, InvoiceUpdate, InvoiceView};
pub use overdue_classifier::{days_overdue, effective_display_status};
