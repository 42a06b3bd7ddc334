use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::modules::invoices::models::{DisplayStatus, Invoice};

/// Order in which breakdown rows are reported
const STATUS_ORDER: [DisplayStatus; 4] = [
    DisplayStatus::Pending,
    DisplayStatus::Overdue,
    DisplayStatus::Paid,
    DisplayStatus::Cancelled,
];

/// Receivables over invoices issued in a date range, as of a given day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivablesReport {
    /// Start of the issue-date range (inclusive)
    pub start_date: NaiveDate,
    /// End of the issue-date range (inclusive)
    pub end_date: NaiveDate,
    /// Day the display statuses were evaluated for
    pub as_of: NaiveDate,
    /// One row per display status, always all four
    pub breakdown: Vec<StatusBreakdown>,
    /// Σ total of non-cancelled invoices
    pub invoiced_total: Decimal,
    /// Σ tax of non-cancelled invoices
    pub tax_total: Decimal,
    /// Σ paid of non-cancelled invoices
    pub collected_total: Decimal,
    /// Σ balance of PENDING and OVERDUE invoices
    pub outstanding_balance: Decimal,
    /// Σ balance of OVERDUE invoices
    pub overdue_balance: Decimal,
}

/// Aggregates for invoices sharing one display status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub status: DisplayStatus,
    pub invoice_count: i64,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
}

impl StatusBreakdown {
    fn empty(status: DisplayStatus) -> Self {
        Self {
            status,
            invoice_count: 0,
            total_amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }
}

impl ReceivablesReport {
    /// Aggregate `invoices`, classifying each one for `as_of`
    pub fn build(
        start_date: NaiveDate,
        end_date: NaiveDate,
        as_of: NaiveDate,
        invoices: &[Invoice],
    ) -> Self {
        let mut breakdown: Vec<StatusBreakdown> =
            STATUS_ORDER.iter().copied().map(StatusBreakdown::empty).collect();
        let mut tax_total = Decimal::ZERO;

        for invoice in invoices {
            let status = invoice.display_status(as_of);
            if let Some(row) = breakdown.iter_mut().find(|row| row.status == status) {
                row.invoice_count += 1;
                row.total_amount += invoice.total();
                row.paid_amount += invoice.paid_amount;
                row.balance += invoice.balance();
            }
            if status != DisplayStatus::Cancelled {
                tax_total += invoice.pricing.totals().tax_amount;
            }
        }

        let sum = |statuses: &[DisplayStatus], field: fn(&StatusBreakdown) -> Decimal| {
            breakdown
                .iter()
                .filter(|row| statuses.contains(&row.status))
                .map(field)
                .sum::<Decimal>()
        };

        let open = [DisplayStatus::Pending, DisplayStatus::Overdue];
        let billed = [DisplayStatus::Pending, DisplayStatus::Overdue, DisplayStatus::Paid];

        Self {
            start_date,
            end_date,
            as_of,
            invoiced_total: sum(&billed, |row| row.total_amount),
            tax_total,
            collected_total: sum(&billed, |row| row.paid_amount),
            outstanding_balance: sum(&open, |row| row.balance),
            overdue_balance: sum(&[DisplayStatus::Overdue], |row| row.balance),
            breakdown,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.breakdown.iter().all(|row| row.invoice_count == 0)
    }

    pub fn row(&self, status: DisplayStatus) -> Option<&StatusBreakdown> {
        self.breakdown.iter().find(|row| row.status == status)
    }
}
