// Reports module: receivables aggregated by display status

pub mod controllers;
pub mod models;
pub mod services;

pub use models::ReceivablesReport;
pub use services::ReportService;
