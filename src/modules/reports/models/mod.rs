mod receivables_report;

pub use receivables_report::{ReceivablesReport, StatusBreakdown};
