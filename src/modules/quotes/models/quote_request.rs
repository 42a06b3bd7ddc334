use chrono::{Days, NaiveDate};
use serde::Deserialize;

use super::quote::{QuoteChanges, QuoteDraft, QuoteStatus};
use crate::core::{Percent, Result};
use crate::modules::invoices::models::InvoiceType;
use crate::modules::totals::models::{prepare_line_items, LineItemInput, Pricing, PricingChanges};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuoteRequest {
    pub client_id: String,
    /// Defaults to today in the business calendar
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Defaults to `date` plus the configured validity
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub discount_percent: Percent,
    #[serde(default)]
    pub tax_rate: Percent,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateQuoteRequest {
    pub fn into_draft(self, today: NaiveDate, validity_days: u32) -> Result<QuoteDraft> {
        let items = prepare_line_items(self.items)?;
        let pricing = Pricing::new(items, self.discount_percent, self.tax_rate)?;

        let issue_date = self.date.unwrap_or(today);
        let valid_until = self
            .valid_until
            .or_else(|| default_valid_until(issue_date, validity_days));

        Ok(QuoteDraft {
            client_id: self.client_id.trim().to_string(),
            issue_date,
            valid_until,
            pricing,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// `validity_days == 0` leaves the quote open-ended
pub(crate) fn default_valid_until(issue_date: NaiveDate, validity_days: u32) -> Option<NaiveDate> {
    if validity_days == 0 {
        return None;
    }
    issue_date.checked_add_days(Days::new(validity_days as u64))
}

/// Partial edit; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuoteRequest {
    #[serde(default)]
    pub items: Option<Vec<LineItemInput>>,
    #[serde(default)]
    pub discount_percent: Option<Percent>,
    #[serde(default)]
    pub tax_rate: Option<Percent>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdateQuoteRequest {
    pub fn into_changes(self) -> Result<QuoteChanges> {
        let items = self.items.map(prepare_line_items).transpose()?;

        Ok(QuoteChanges {
            pricing: PricingChanges {
                items,
                discount_percent: self.discount_percent,
                tax_rate: self.tax_rate,
            },
            valid_until: self.valid_until,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteStatusRequest {
    pub status: QuoteStatus,
}

/// Options for turning an accepted quote into an invoice
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConvertQuoteRequest {
    #[serde(default)]
    pub invoice_type: InvoiceType,
    /// Defaults to today plus the configured payment terms
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteListQuery {
    #[serde(default)]
    pub status: Option<QuoteStatus>,
    #[serde(default)]
    pub client_id: Option<String>,
}
