use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::core::{AppError, BusinessCalendar, Result};
use crate::middleware::auth::CallerContext;
use crate::modules::invoices::repositories::{InvoiceFilter, InvoiceRepository};
use crate::modules::reports::models::ReceivablesReport;

/// Longest range a single report may cover, in days
pub const MAX_RANGE_DAYS: i64 = 366;

/// Service for receivables reporting
pub struct ReportService {
    invoices: Arc<dyn InvoiceRepository>,
    calendar: BusinessCalendar,
}

impl ReportService {
    pub fn new(invoices: Arc<dyn InvoiceRepository>, calendar: BusinessCalendar) -> Self {
        Self { invoices, calendar }
    }

    /// Receivables for invoices issued between `start_date` and `end_date`
    /// (inclusive), with overdue evaluated as of `as_of` (default today).
    pub async fn receivables_report(
        &self,
        ctx: &CallerContext,
        start_date: NaiveDate,
        end_date: NaiveDate,
        as_of: Option<NaiveDate>,
    ) -> Result<ReceivablesReport> {
        self.validate_date_range(start_date, end_date)?;

        let as_of = as_of.unwrap_or_else(|| self.calendar.today());
        let filter = InvoiceFilter {
            issued_between: Some((start_date, end_date)),
            ..Default::default()
        };
        let invoices = self.invoices.list(&ctx.tenant_id, &filter).await?;

        let report = ReceivablesReport::build(start_date, end_date, as_of, &invoices);

        if report.is_empty() {
            warn!(
                tenant_id = %ctx.tenant_id,
                %start_date,
                %end_date,
                "Empty receivables report"
            );
        } else {
            info!(
                tenant_id = %ctx.tenant_id,
                %start_date,
                %end_date,
                invoices = invoices.len(),
                outstanding = %report.outstanding_balance,
                "Receivables report generated"
            );
        }

        Ok(report)
    }

    pub fn validate_date_range(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<()> {
        if start_date > end_date {
            return Err(AppError::validation(format!(
                "start_date ({}) must be before or equal to end_date ({})",
                start_date, end_date
            )));
        }

        let days = (end_date - start_date).num_days();
        if days > MAX_RANGE_DAYS {
            return Err(AppError::validation(format!(
                "Date range too large: {} days (maximum {} days)",
                days, MAX_RANGE_DAYS
            )));
        }

        Ok(())
    }
}
