// Invoices module: invoice lifecycle, edit/delete guards and overdue classification

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{DisplayStatus, Invoice, InvoiceStatus, InvoiceType};
pub use repositories::{InvoiceRepository, MySqlInvoiceRepository};
pub use services::{effective_display_status, InvoiceService};
