mod invoice;
mod invoice_request;

pub use invoice::{
    DisplayStatus, Invoice, InvoiceChanges, InvoiceDraft, InvoiceStatus, InvoiceType,
};
pub(crate) use invoice_request::default_due_date;
pub use invoice_request::{
    CreateInvoiceRequest, InvoiceListQuery, InvoiceStatusRequest, UpdateInvoiceRequest,
};
