// Invoice model with its status lifecycle and edit/delete guards.
//
// An invoice is a billing document owed by a client. Status moves through an
// explicit allow-list; the only backward move is reactivating a cancelled
// invoice. Overdue is never stored, see `services::overdue_classifier`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::money::format_amount;
use crate::core::{AppError, Result};
use crate::modules::invoices::services::overdue_classifier;
use crate::modules::payments::models::Payment;
use crate::modules::totals::models::{Pricing, PricingChanges};

/// Stored invoice status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    /// Issued and awaiting payment
    #[default]
    Pending,

    /// Settled in full
    Paid,

    /// Voided; may be reactivated
    Cancelled,
}

impl InvoiceStatus {
    /// Legal next states
    pub fn allowed_transitions(&self) -> &'static [InvoiceStatus] {
        match self {
            InvoiceStatus::Pending => &[InvoiceStatus::Paid, InvoiceStatus::Cancelled],
            InvoiceStatus::Cancelled => &[InvoiceStatus::Pending],
            InvoiceStatus::Paid => &[],
        }
    }

    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(InvoiceStatus::Pending),
            "PAID" => Ok(InvoiceStatus::Paid),
            "CANCELLED" => Ok(InvoiceStatus::Cancelled),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// Status label shown to callers, derived on every read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisplayStatus {
    Pending,
    Overdue,
    Paid,
    Cancelled,
}

impl DisplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStatus::Pending => "PENDING",
            DisplayStatus::Overdue => "OVERDUE",
            DisplayStatus::Paid => "PAID",
            DisplayStatus::Cancelled => "CANCELLED",
        }
    }
}

impl From<InvoiceStatus> for DisplayStatus {
    fn from(status: InvoiceStatus) -> Self {
        match status {
            InvoiceStatus::Pending => DisplayStatus::Pending,
            InvoiceStatus::Paid => DisplayStatus::Paid,
            InvoiceStatus::Cancelled => DisplayStatus::Cancelled,
        }
    }
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the invoice bills for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceType {
    #[default]
    Service,
    Equipment,
}

impl InvoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Service => "SERVICE",
            InvoiceType::Equipment => "EQUIPMENT",
        }
    }
}

impl std::str::FromStr for InvoiceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SERVICE" => Ok(InvoiceType::Service),
            "EQUIPMENT" => Ok(InvoiceType::Equipment),
            _ => Err(format!("Invalid invoice type: {}", s)),
        }
    }
}

/// Validated input for a new invoice
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub client_id: String,
    pub quote_id: Option<String>,
    pub invoice_type: InvoiceType,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub pricing: Pricing,
    pub notes: Option<String>,
}

/// Partial update of an invoice
#[derive(Debug, Clone, Default)]
pub struct InvoiceChanges {
    pub pricing: PricingChanges,
    pub invoice_type: Option<InvoiceType>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// A billing document owed by a client
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    /// Unique invoice ID (UUID)
    pub id: String,

    /// Owning company
    pub tenant_id: String,

    /// System-assigned number, unique per tenant
    pub number: String,

    pub client_id: String,

    /// Quote this invoice was converted from
    pub quote_id: Option<String>,

    pub invoice_type: InvoiceType,

    pub issue_date: NaiveDate,

    pub due_date: Option<NaiveDate>,

    pub status: InvoiceStatus,

    /// Items, rates and derived totals
    pub pricing: Pricing,

    /// Amount settled so far, 0 ≤ paid_amount ≤ total
    pub paid_amount: Decimal,

    pub notes: Option<String>,

    /// Ledger of recorded payments, oldest first
    pub payments: Vec<Payment>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Create a new PENDING invoice with nothing paid
    pub fn new(tenant_id: String, number: String, draft: InvoiceDraft) -> Result<Self> {
        if draft.client_id.trim().is_empty() {
            return Err(AppError::validation("Client ID cannot be empty"));
        }
        Self::validate_due_date(draft.issue_date, draft.due_date)?;

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            number,
            client_id: draft.client_id,
            quote_id: draft.quote_id,
            invoice_type: draft.invoice_type,
            issue_date: draft.issue_date,
            due_date: draft.due_date,
            status: InvoiceStatus::Pending,
            pricing: draft.pricing,
            paid_amount: Decimal::ZERO,
            notes: draft.notes,
            payments: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn total(&self) -> Decimal {
        self.pricing.total()
    }

    /// Amount still owed
    pub fn balance(&self) -> Decimal {
        self.total() - self.paid_amount
    }

    /// Σ of recorded payments
    pub fn recorded_payments(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Move to `next` if the transition table allows it.
    ///
    /// PENDING → PAID is the "mark as paid" settlement: `paid_amount` becomes
    /// the total regardless of payments recorded so far.
    pub fn transition_to(&mut self, next: InvoiceStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::state(format!(
                "Invalid status transition from {} to {} for invoice {}",
                self.status, next, self.number
            )));
        }

        if next == InvoiceStatus::Paid {
            self.paid_amount = self.total();
        }

        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// PENDING invoices are editable by anyone, other states only by elevated callers
    pub fn can_edit(&self, caller_is_elevated: bool) -> bool {
        self.status == InvoiceStatus::Pending || caller_is_elevated
    }

    /// Apply an edit, returning warnings the caller must surface.
    ///
    /// The new total can never drop below what payments already cover. A
    /// PAID invoice stays settled: its paid amount follows the new total.
    pub fn apply_changes(
        &mut self,
        changes: InvoiceChanges,
        caller_is_elevated: bool,
    ) -> Result<Vec<String>> {
        if !self.can_edit(caller_is_elevated) {
            return Err(AppError::state(format!(
                "Invoice {} is {} and can only be edited by an administrator",
                self.number, self.status
            )));
        }

        let pricing = if changes.pricing.is_empty() {
            self.pricing.clone()
        } else {
            self.pricing.apply(changes.pricing)?
        };

        let floor = self.recorded_payments().max(match self.status {
            InvoiceStatus::Paid => Decimal::ZERO,
            _ => self.paid_amount,
        });
        if pricing.total() < floor {
            return Err(AppError::validation(format!(
                "New total {} is below the {} already paid on invoice {}",
                format_amount(pricing.total()),
                format_amount(floor),
                self.number
            )));
        }

        let due_date = changes.due_date.or(self.due_date);
        Self::validate_due_date(self.issue_date, due_date)?;

        let mut warnings = Vec::new();
        if self.status == InvoiceStatus::Paid {
            warnings.push(format!(
                "Invoice {} is already paid; the settled amount now follows the edited total",
                self.number
            ));
            self.paid_amount = pricing.total();
        } else if self.status == InvoiceStatus::Cancelled {
            warnings.push(format!("Invoice {} is cancelled", self.number));
        }

        self.pricing = pricing;
        self.due_date = due_date;
        if let Some(invoice_type) = changes.invoice_type {
            self.invoice_type = invoice_type;
        }
        if let Some(notes) = changes.notes {
            self.notes = Some(notes).filter(|n| !n.trim().is_empty());
        }
        self.updated_at = Utc::now();

        Ok(warnings)
    }

    /// Deletion loses the document, so anything with monetary history is kept
    pub fn can_delete(&self) -> bool {
        self.status != InvoiceStatus::Paid && self.payments.is_empty()
    }

    pub fn ensure_deletable(&self) -> Result<()> {
        if self.status == InvoiceStatus::Paid {
            return Err(AppError::state(format!(
                "Invoice {} is paid and cannot be deleted",
                self.number
            )));
        }

        if !self.payments.is_empty() {
            return Err(AppError::state(format!(
                "Invoice {} has {} recorded payment(s) and cannot be deleted",
                self.number,
                self.payments.len()
            )));
        }

        Ok(())
    }

    /// Status label for `today`
    pub fn display_status(&self, today: NaiveDate) -> DisplayStatus {
        overdue_classifier::effective_display_status(self, today)
    }

    fn validate_due_date(issue_date: NaiveDate, due_date: Option<NaiveDate>) -> Result<()> {
        if let Some(due) = due_date {
            if due < issue_date {
                return Err(AppError::validation(format!(
                    "Due date {} cannot be before the invoice date {}",
                    due, issue_date
                )));
            }
        }

        Ok(())
    }
}
