use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use crate::core::{AppError, BusinessCalendar, DocumentKind, NumberSequence, Result};
use crate::middleware::auth::CallerContext;
use crate::modules::invoices::models::{
    CreateInvoiceRequest, DisplayStatus, Invoice, InvoiceDraft, InvoiceListQuery, InvoiceStatus,
    UpdateInvoiceRequest,
};
use crate::modules::invoices::repositories::{
    InvoiceChange, InvoiceFilter, InvoiceGuard, InvoiceRepository,
};
use crate::modules::notifications::{dispatch, BillingEvent, Notifier};

/// An invoice as shown to callers, with its status label for today
#[derive(Debug, Clone)]
pub struct InvoiceView {
    pub invoice: Invoice,
    pub display_status: DisplayStatus,
}

/// Result of an edit, with warnings the caller must surface
#[derive(Debug, Clone)]
pub struct InvoiceUpdate {
    pub view: InvoiceView,
    pub warnings: Vec<String>,
}

/// Service for invoice business logic
pub struct InvoiceService {
    repository: Arc<dyn InvoiceRepository>,
    numbers: Arc<dyn NumberSequence>,
    notifier: Arc<dyn Notifier>,
    calendar: BusinessCalendar,
    payment_terms_days: u32,
}

impl InvoiceService {
    pub fn new(
        repository: Arc<dyn InvoiceRepository>,
        numbers: Arc<dyn NumberSequence>,
        notifier: Arc<dyn Notifier>,
        calendar: BusinessCalendar,
        payment_terms_days: u32,
    ) -> Self {
        Self {
            repository,
            numbers,
            notifier,
            calendar,
            payment_terms_days,
        }
    }

    /// Today in the business calendar
    pub fn today(&self) -> NaiveDate {
        self.calendar.today()
    }

    pub fn payment_terms_days(&self) -> u32 {
        self.payment_terms_days
    }

    pub fn view(&self, invoice: Invoice) -> InvoiceView {
        let display_status = invoice.display_status(self.today());
        InvoiceView {
            invoice,
            display_status,
        }
    }

    /// Create a PENDING invoice with a fresh number
    pub async fn create_invoice(
        &self,
        ctx: &CallerContext,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceView> {
        let draft = request.into_draft(self.today(), self.payment_terms_days)?;
        let invoice = self.build_invoice(ctx, draft).await?;

        self.repository.create(&invoice).await?;

        info!(
            tenant_id = %ctx.tenant_id,
            invoice_id = %invoice.id,
            number = %invoice.number,
            total = %invoice.total(),
            "Invoice created"
        );

        Ok(self.view(invoice))
    }

    /// Number and validate an invoice without persisting it
    pub async fn build_invoice(&self, ctx: &CallerContext, draft: InvoiceDraft) -> Result<Invoice> {
        let number = self
            .numbers
            .next_number(&ctx.tenant_id, DocumentKind::Invoice, draft.issue_date.year())
            .await?;

        Invoice::new(ctx.tenant_id.clone(), number, draft)
    }

    pub async fn get_invoice(&self, ctx: &CallerContext, id: &str) -> Result<InvoiceView> {
        let invoice = self
            .repository
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", id)))?;

        Ok(self.view(invoice))
    }

    pub async fn list_invoices(
        &self,
        ctx: &CallerContext,
        query: InvoiceListQuery,
    ) -> Result<Vec<InvoiceView>> {
        let filter = InvoiceFilter {
            status: query.status,
            client_id: query.client_id.filter(|c| !c.trim().is_empty()),
            issued_between: None,
        };

        let views = self
            .repository
            .list(&ctx.tenant_id, &filter)
            .await?
            .into_iter()
            .map(|invoice| self.view(invoice))
            .filter(|view| !query.overdue_only || view.display_status == DisplayStatus::Overdue)
            .collect();

        Ok(views)
    }

    /// Edit items, rates or terms. Totals are recomputed from scratch.
    pub async fn update_invoice(
        &self,
        ctx: &CallerContext,
        id: &str,
        request: UpdateInvoiceRequest,
    ) -> Result<InvoiceUpdate> {
        let changes = request.into_changes()?;
        let guard = self.lock(ctx, id).await?;

        let mut invoice = guard.invoice().clone();
        let warnings = invoice.apply_changes(changes, ctx.is_elevated())?;

        guard.commit(&invoice, InvoiceChange::Document).await?;

        if warnings.is_empty() {
            info!(tenant_id = %ctx.tenant_id, invoice_id = %id, "Invoice updated");
        } else {
            warn!(
                tenant_id = %ctx.tenant_id,
                invoice_id = %id,
                status = %invoice.status,
                role = %ctx.role,
                "Invoice edited outside PENDING"
            );
        }

        Ok(InvoiceUpdate {
            view: self.view(invoice),
            warnings,
        })
    }

    /// Validate and apply a status change
    pub async fn transition_invoice_status(
        &self,
        ctx: &CallerContext,
        id: &str,
        next: InvoiceStatus,
    ) -> Result<InvoiceView> {
        let guard = self.lock(ctx, id).await?;

        let mut invoice = guard.invoice().clone();
        let previous = invoice.status;
        if let Err(e) = invoice.transition_to(next) {
            warn!(invoice_id = %id, from = %previous, to = %next, "Rejected invoice transition");
            return Err(e);
        }

        guard.commit(&invoice, InvoiceChange::Status).await?;

        info!(
            tenant_id = %ctx.tenant_id,
            invoice_id = %id,
            from = %previous,
            to = %next,
            paid_amount = %invoice.paid_amount,
            "Invoice status changed"
        );

        if next == InvoiceStatus::Paid {
            dispatch(
                self.notifier.clone(),
                BillingEvent::InvoicePaid {
                    tenant_id: invoice.tenant_id.clone(),
                    invoice_id: invoice.id.clone(),
                    number: invoice.number.clone(),
                    client_id: invoice.client_id.clone(),
                    total: invoice.total(),
                },
            );
        }

        Ok(self.view(invoice))
    }

    /// Delete an invoice with no monetary history
    pub async fn delete_invoice(&self, ctx: &CallerContext, id: &str) -> Result<()> {
        let guard = self.lock(ctx, id).await?;

        let invoice = guard.invoice().clone();
        invoice.ensure_deletable()?;

        guard.commit(&invoice, InvoiceChange::Delete).await?;

        info!(
            tenant_id = %ctx.tenant_id,
            invoice_id = %id,
            number = %invoice.number,
            "Invoice deleted"
        );

        Ok(())
    }

    async fn lock(&self, ctx: &CallerContext, id: &str) -> Result<Box<dyn InvoiceGuard>> {
        self.repository
            .lock(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", id)))
    }
}
