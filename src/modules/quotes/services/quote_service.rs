use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use crate::core::{AppError, BusinessCalendar, DocumentKind, NumberSequence, Result};
use crate::middleware::auth::CallerContext;
use crate::modules::invoices::models::default_due_date;
use crate::modules::invoices::services::{InvoiceService, InvoiceView};
use crate::modules::notifications::{dispatch, BillingEvent, Notifier};
use crate::modules::quotes::models::{
    default_valid_until, ConvertQuoteRequest, CreateQuoteRequest, Quote, QuoteDraft,
    QuoteListQuery, QuoteStatus, UpdateQuoteRequest,
};
use crate::modules::quotes::repositories::{QuoteChange, QuoteFilter, QuoteGuard, QuoteRepository};

/// A converted quote together with the invoice it produced
#[derive(Debug, Clone)]
pub struct QuoteConversion {
    pub quote: Quote,
    pub invoice: InvoiceView,
}

/// Service for quote business logic
pub struct QuoteService {
    repository: Arc<dyn QuoteRepository>,
    invoices: Arc<InvoiceService>,
    numbers: Arc<dyn NumberSequence>,
    notifier: Arc<dyn Notifier>,
    calendar: BusinessCalendar,
    validity_days: u32,
}

impl QuoteService {
    pub fn new(
        repository: Arc<dyn QuoteRepository>,
        invoices: Arc<InvoiceService>,
        numbers: Arc<dyn NumberSequence>,
        notifier: Arc<dyn Notifier>,
        calendar: BusinessCalendar,
        validity_days: u32,
    ) -> Self {
        Self {
            repository,
            invoices,
            numbers,
            notifier,
            calendar,
            validity_days,
        }
    }

    fn today(&self) -> NaiveDate {
        self.calendar.today()
    }

    /// Create a DRAFT quote with a fresh number
    pub async fn create_quote(&self, ctx: &CallerContext, request: CreateQuoteRequest) -> Result<Quote> {
        let draft = request.into_draft(self.today(), self.validity_days)?;
        let quote = self.insert(ctx, draft).await?;

        info!(
            tenant_id = %ctx.tenant_id,
            quote_id = %quote.id,
            number = %quote.number,
            total = %quote.pricing.total(),
            "Quote created"
        );

        Ok(quote)
    }

    pub async fn get_quote(&self, ctx: &CallerContext, id: &str) -> Result<Quote> {
        self.repository
            .find_by_id(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Quote {}", id)))
    }

    pub async fn list_quotes(&self, ctx: &CallerContext, query: QuoteListQuery) -> Result<Vec<Quote>> {
        let filter = QuoteFilter {
            status: query.status,
            client_id: query.client_id.filter(|c| !c.trim().is_empty()),
        };

        self.repository.list(&ctx.tenant_id, &filter).await
    }

    /// Edit items, rates or terms while DRAFT or SENT
    pub async fn update_quote(
        &self,
        ctx: &CallerContext,
        id: &str,
        request: UpdateQuoteRequest,
    ) -> Result<Quote> {
        let changes = request.into_changes()?;
        let guard = self.lock(ctx, id).await?;

        let mut quote = guard.quote().clone();
        if let Err(e) = quote.apply_changes(changes) {
            warn!(quote_id = %id, status = %quote.status, "Rejected quote edit");
            return Err(e);
        }

        guard.commit(&quote, QuoteChange::Document).await?;

        info!(tenant_id = %ctx.tenant_id, quote_id = %id, "Quote updated");
        Ok(quote)
    }

    pub async fn transition_quote_status(
        &self,
        ctx: &CallerContext,
        id: &str,
        next: QuoteStatus,
    ) -> Result<Quote> {
        let guard = self.lock(ctx, id).await?;

        let mut quote = guard.quote().clone();
        let previous = quote.status;
        if let Err(e) = quote.transition_to(next) {
            warn!(quote_id = %id, from = %previous, to = %next, "Rejected quote transition");
            return Err(e);
        }

        guard.commit(&quote, QuoteChange::Status).await?;

        info!(
            tenant_id = %ctx.tenant_id,
            quote_id = %id,
            from = %previous,
            to = %next,
            "Quote status changed"
        );

        if next == QuoteStatus::Sent {
            dispatch(
                self.notifier.clone(),
                BillingEvent::QuoteSent {
                    tenant_id: quote.tenant_id.clone(),
                    quote_id: quote.id.clone(),
                    number: quote.number.clone(),
                    client_id: quote.client_id.clone(),
                    total: quote.pricing.total(),
                },
            );
        }

        Ok(quote)
    }

    /// Copy items and terms into a new DRAFT quote dated today
    pub async fn duplicate_quote(&self, ctx: &CallerContext, id: &str) -> Result<Quote> {
        let source = self.get_quote(ctx, id).await?;

        let today = self.today();
        let draft = source.duplicate(today, default_valid_until(today, self.validity_days));
        let copy = self.insert(ctx, draft).await?;

        info!(
            tenant_id = %ctx.tenant_id,
            source_id = %source.id,
            quote_id = %copy.id,
            number = %copy.number,
            "Quote duplicated"
        );

        Ok(copy)
    }

    /// Create the single invoice an ACCEPTED quote may spawn
    pub async fn convert_quote_to_invoice(
        &self,
        ctx: &CallerContext,
        id: &str,
        request: ConvertQuoteRequest,
    ) -> Result<QuoteConversion> {
        let guard = self.lock(ctx, id).await?;
        let mut quote = guard.quote().clone();

        let today = self.today();
        let due_date = request
            .due_date
            .or_else(|| default_due_date(today, self.invoices.payment_terms_days()));

        let draft = match quote.invoice_draft(request.invoice_type, today, due_date) {
            Ok(draft) => draft,
            Err(e) => {
                warn!(quote_id = %id, status = %quote.status, error = %e, "Rejected quote conversion");
                return Err(e);
            }
        };

        let invoice = self.invoices.build_invoice(ctx, draft).await?;
        quote.link_invoice(&invoice.id)?;

        guard
            .commit(&quote, QuoteChange::LinkInvoice(&invoice))
            .await?;

        info!(
            tenant_id = %ctx.tenant_id,
            quote_id = %quote.id,
            invoice_id = %invoice.id,
            invoice_number = %invoice.number,
            "Quote converted to invoice"
        );

        Ok(QuoteConversion {
            invoice: self.invoices.view(invoice),
            quote,
        })
    }

    async fn insert(&self, ctx: &CallerContext, draft: QuoteDraft) -> Result<Quote> {
        let number = self
            .numbers
            .next_number(&ctx.tenant_id, DocumentKind::Quote, draft.issue_date.year())
            .await?;

        let quote = Quote::new(ctx.tenant_id.clone(), number, draft)?;
        self.repository.create(&quote).await?;

        Ok(quote)
    }

    async fn lock(&self, ctx: &CallerContext, id: &str) -> Result<Box<dyn QuoteGuard>> {
        self.repository
            .lock(&ctx.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Quote {}", id)))
    }
}
