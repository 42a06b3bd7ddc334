use chrono::{Days, NaiveDate};
use serde::Deserialize;

use super::invoice::{InvoiceChanges, InvoiceDraft, InvoiceStatus, InvoiceType};
use crate::core::{Percent, Result};
use crate::modules::totals::models::{prepare_line_items, LineItemInput, Pricing, PricingChanges};

/// Request to create an invoice directly (not from a quote)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceRequest {
    pub client_id: String,
    #[serde(default)]
    pub invoice_type: InvoiceType,
    /// Defaults to today in the business calendar
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Defaults to `date` plus the configured payment terms
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub discount_percent: Percent,
    #[serde(default)]
    pub tax_rate: Percent,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateInvoiceRequest {
    /// Validate items and fill defaults. `payment_terms_days == 0` leaves the due date open.
    pub fn into_draft(self, today: NaiveDate, payment_terms_days: u32) -> Result<InvoiceDraft> {
        let items = prepare_line_items(self.items)?;
        let pricing = Pricing::new(items, self.discount_percent, self.tax_rate)?;

        let issue_date = self.date.unwrap_or(today);
        let due_date = self.due_date.or_else(|| default_due_date(issue_date, payment_terms_days));

        Ok(InvoiceDraft {
            client_id: self.client_id.trim().to_string(),
            quote_id: None,
            invoice_type: self.invoice_type,
            issue_date,
            due_date,
            pricing,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

pub(crate) fn default_due_date(issue_date: NaiveDate, payment_terms_days: u32) -> Option<NaiveDate> {
    if payment_terms_days == 0 {
        return None;
    }
    issue_date.checked_add_days(Days::new(payment_terms_days as u64))
}

/// Partial edit; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateInvoiceRequest {
    #[serde(default)]
    pub items: Option<Vec<LineItemInput>>,
    #[serde(default)]
    pub discount_percent: Option<Percent>,
    #[serde(default)]
    pub tax_rate: Option<Percent>,
    #[serde(default)]
    pub invoice_type: Option<InvoiceType>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdateInvoiceRequest {
    pub fn into_changes(self) -> Result<InvoiceChanges> {
        let items = self.items.map(prepare_line_items).transpose()?;

        Ok(InvoiceChanges {
            pricing: PricingChanges {
                items,
                discount_percent: self.discount_percent,
                tax_rate: self.tax_rate,
            },
            invoice_type: self.invoice_type,
            due_date: self.due_date,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceStatusRequest {
    pub status: InvoiceStatus,
}

/// Filters for listing invoices
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceListQuery {
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub client_id: Option<String>,
    /// Only PENDING invoices past their due date
    #[serde(default)]
    pub overdue_only: bool,
}
