// Overdue classification.
//
// OVERDUE is a view of a PENDING invoice whose due date has passed. It is
// recomputed on every read and never written back to `status`.

use chrono::NaiveDate;

use crate::modules::invoices::models::{DisplayStatus, Invoice, InvoiceStatus};

/// Status label for `invoice` as of `today`.
///
/// `today` must already be a local calendar date (see `BusinessCalendar`),
/// the comparison is date-only.
pub fn effective_display_status(invoice: &Invoice, today: NaiveDate) -> DisplayStatus {
    match invoice.status {
        InvoiceStatus::Pending => match invoice.due_date {
            Some(due_date) if due_date < today => DisplayStatus::Overdue,
            _ => DisplayStatus::Pending,
        },
        status => status.into(),
    }
}

/// Whole days past due, `None` unless the invoice is overdue
pub fn days_overdue(invoice: &Invoice, today: NaiveDate) -> Option<i64> {
    match effective_display_status(invoice, today) {
        DisplayStatus::Overdue => invoice.due_date.map(|due| (today - due).num_days()),
        _ => None,
    }
}
