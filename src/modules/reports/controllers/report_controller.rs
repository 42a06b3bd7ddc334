use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::AppError;
use crate::core::money;
use crate::middleware::auth::CallerContext;
use crate::modules::invoices::models::DisplayStatus;
use crate::modules::reports::models::{ReceivablesReport, StatusBreakdown};
use crate::modules::reports::services::ReportService;

/// Query parameters for the receivables report endpoint
#[derive(Debug, Deserialize)]
pub struct ReceivablesReportQuery {
    /// Start of the issue-date range (inclusive, format: YYYY-MM-DD)
    pub start_date: String,
    /// End of the issue-date range (inclusive, format: YYYY-MM-DD)
    pub end_date: String,
    /// Evaluate overdue as of this day instead of today
    #[serde(default)]
    pub as_of: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceivablesReportResponse {
    pub start_date: String,
    pub end_date: String,
    pub as_of: String,
    pub breakdown: Vec<StatusBreakdownResponse>,
    pub invoiced_total: String, // Decimal as string for JSON precision
    pub tax_total: String,
    pub collected_total: String,
    pub outstanding_balance: String,
    pub overdue_balance: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBreakdownResponse {
    pub status: DisplayStatus,
    pub invoice_count: i64,
    pub total_amount: String,
    pub paid_amount: String,
    pub balance: String,
}

impl From<ReceivablesReport> for ReceivablesReportResponse {
    fn from(report: ReceivablesReport) -> Self {
        Self {
            start_date: report.start_date.format("%Y-%m-%d").to_string(),
            end_date: report.end_date.format("%Y-%m-%d").to_string(),
            as_of: report.as_of.format("%Y-%m-%d").to_string(),
            breakdown: report
                .breakdown
                .into_iter()
                .map(StatusBreakdownResponse::from)
                .collect(),
            invoiced_total: money::format_amount(report.invoiced_total),
            tax_total: money::format_amount(report.tax_total),
            collected_total: money::format_amount(report.collected_total),
            outstanding_balance: money::format_amount(report.outstanding_balance),
            overdue_balance: money::format_amount(report.overdue_balance),
        }
    }
}

impl From<StatusBreakdown> for StatusBreakdownResponse {
    fn from(row: StatusBreakdown) -> Self {
        Self {
            status: row.status,
            invoice_count: row.invoice_count,
            total_amount: money::format_amount(row.total_amount),
            paid_amount: money::format_amount(row.paid_amount),
            balance: money::format_amount(row.balance),
        }
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        AppError::validation(format!(
            "Invalid {} format: '{}'. Expected YYYY-MM-DD",
            field, value
        ))
    })
}

/// GET /reports/receivables?start_date=2025-01-01&end_date=2025-03-31
pub async fn get_receivables_report(
    service: web::Data<Arc<ReportService>>,
    ctx: CallerContext,
    query: web::Query<ReceivablesReportQuery>,
) -> Result<HttpResponse, AppError> {
    let start_date = parse_date("start_date", &query.start_date)?;
    let end_date = parse_date("end_date", &query.end_date)?;
    let as_of = query
        .as_of
        .as_deref()
        .map(|value| parse_date("as_of", value))
        .transpose()?;

    let report = service
        .receivables_report(&ctx, start_date, end_date, as_of)
        .await?;

    Ok(HttpResponse::Ok().json(ReceivablesReportResponse::from(report)))
}

/// Configure routes for reports module
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reports").route("/receivables", web::get().to(get_receivables_report)),
    );
}
