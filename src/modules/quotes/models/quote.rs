// Quote model and its forward-only status lifecycle.
//
// DRAFT → SENT → {ACCEPTED, REJECTED}. Field edits are allowed while DRAFT
// or SENT; afterwards the quote is frozen and duplication is the way to
// start over. An ACCEPTED quote may spawn exactly one invoice.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::invoices::models::{InvoiceDraft, InvoiceType};
use crate::modules::totals::models::{Pricing, PricingChanges};

/// Stored quote status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
}

impl QuoteStatus {
    /// Legal next states. No transition skips SENT and none goes backwards.
    pub fn allowed_transitions(&self) -> &'static [QuoteStatus] {
        match self {
            QuoteStatus::Draft => &[QuoteStatus::Sent],
            QuoteStatus::Sent => &[QuoteStatus::Accepted, QuoteStatus::Rejected],
            QuoteStatus::Accepted | QuoteStatus::Rejected => &[],
        }
    }

    pub fn can_transition_to(&self, next: QuoteStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, QuoteStatus::Draft | QuoteStatus::Sent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "DRAFT",
            QuoteStatus::Sent => "SENT",
            QuoteStatus::Accepted => "ACCEPTED",
            QuoteStatus::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(QuoteStatus::Draft),
            "SENT" => Ok(QuoteStatus::Sent),
            "ACCEPTED" => Ok(QuoteStatus::Accepted),
            "REJECTED" => Ok(QuoteStatus::Rejected),
            _ => Err(format!("Invalid quote status: {}", s)),
        }
    }
}

/// Validated input for a new quote
#[derive(Debug, Clone)]
pub struct QuoteDraft {
    pub client_id: String,
    pub issue_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub pricing: Pricing,
    pub notes: Option<String>,
}

/// Partial update of a quote
#[derive(Debug, Clone, Default)]
pub struct QuoteChanges {
    pub pricing: PricingChanges,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// A non-binding proposal of items and prices sent to a client
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub id: String,
    pub tenant_id: String,
    pub number: String,
    pub client_id: String,
    pub issue_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub status: QuoteStatus,
    pub pricing: Pricing,
    pub notes: Option<String>,
    /// Invoice created from this quote; written once
    pub invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    /// Create a new DRAFT quote
    pub fn new(tenant_id: String, number: String, draft: QuoteDraft) -> Result<Self> {
        if draft.client_id.trim().is_empty() {
            return Err(AppError::validation("Client ID cannot be empty"));
        }
        Self::validate_valid_until(draft.issue_date, draft.valid_until)?;

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            number,
            client_id: draft.client_id,
            issue_date: draft.issue_date,
            valid_until: draft.valid_until,
            status: QuoteStatus::Draft,
            pricing: draft.pricing,
            notes: draft.notes,
            invoice_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn transition_to(&mut self, next: QuoteStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::state(format!(
                "Invalid status transition from {} to {} for quote {}",
                self.status, next, self.number
            )));
        }

        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn can_edit(&self) -> bool {
        self.status.is_editable()
    }

    /// Apply an edit while DRAFT or SENT
    pub fn apply_changes(&mut self, changes: QuoteChanges) -> Result<()> {
        if !self.can_edit() {
            return Err(AppError::state(format!(
                "Quote {} is {} and can no longer be edited; duplicate it to make changes",
                self.number, self.status
            )));
        }

        let pricing = if changes.pricing.is_empty() {
            self.pricing.clone()
        } else {
            self.pricing.apply(changes.pricing)?
        };

        let valid_until = changes.valid_until.or(self.valid_until);
        Self::validate_valid_until(self.issue_date, valid_until)?;

        self.pricing = pricing;
        self.valid_until = valid_until;
        if let Some(notes) = changes.notes {
            self.notes = Some(notes).filter(|n| !n.trim().is_empty());
        }
        self.updated_at = Utc::now();

        Ok(())
    }

    /// Items and terms for a fresh DRAFT copy dated `issue_date`
    pub fn duplicate(&self, issue_date: NaiveDate, valid_until: Option<NaiveDate>) -> QuoteDraft {
        QuoteDraft {
            client_id: self.client_id.clone(),
            issue_date,
            valid_until,
            pricing: self.pricing.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Fails unless this quote may spawn its invoice now
    pub fn ensure_convertible(&self) -> Result<()> {
        if let Some(invoice_id) = &self.invoice_id {
            return Err(AppError::link(format!(
                "Quote {} is already linked to invoice {}",
                self.number, invoice_id
            )));
        }

        if self.status != QuoteStatus::Accepted {
            return Err(AppError::state(format!(
                "Quote {} is {}; only ACCEPTED quotes can be invoiced",
                self.number, self.status
            )));
        }

        Ok(())
    }

    /// Invoice pre-filled from this quote's items, discount and tax rate
    pub fn invoice_draft(
        &self,
        invoice_type: InvoiceType,
        issue_date: NaiveDate,
        due_date: Option<NaiveDate>,
    ) -> Result<InvoiceDraft> {
        self.ensure_convertible()?;

        Ok(InvoiceDraft {
            client_id: self.client_id.clone(),
            quote_id: Some(self.id.clone()),
            invoice_type,
            issue_date,
            due_date,
            pricing: self.pricing.clone(),
            notes: self.notes.clone(),
        })
    }

    /// Record the invoice created from this quote. The link is set once.
    pub fn link_invoice(&mut self, invoice_id: &str) -> Result<()> {
        self.ensure_convertible()?;

        self.invoice_id = Some(invoice_id.to_string());
        self.updated_at = Utc::now();
        Ok(())
    }

    fn validate_valid_until(issue_date: NaiveDate, valid_until: Option<NaiveDate>) -> Result<()> {
        match valid_until {
            Some(until) if until < issue_date => Err(AppError::validation(format!(
                "Valid-until date {} cannot be before the quote date {}",
                until, issue_date
            ))),
            _ => Ok(()),
        }
    }
}
