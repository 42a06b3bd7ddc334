use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::core::{AppError, BusinessCalendar, Result};
use crate::middleware::auth::CallerContext;
use crate::modules::invoices::models::Invoice;
use crate::modules::invoices::repositories::{InvoiceChange, InvoiceRepository};
use crate::modules::payments::models::{Payment, PaymentRequest};
use crate::modules::payments::services::payment_ledger::{NewPayment, PaymentLedger};

/// Outcome of a recorded payment
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub invoice: Invoice,
    pub payment: Payment,
    /// Remaining balance after this payment
    pub balance: Decimal,
    /// Payments now cover the total. Status is unchanged until the caller
    /// marks the invoice as paid.
    pub settled: bool,
}

/// Applies payments with the balance check and the append under one invoice lock
pub struct PaymentService {
    invoices: Arc<dyn InvoiceRepository>,
    calendar: BusinessCalendar,
}

impl PaymentService {
    pub fn new(invoices: Arc<dyn InvoiceRepository>, calendar: BusinessCalendar) -> Self {
        Self { invoices, calendar }
    }

    /// Record a payment against a PENDING invoice.
    ///
    /// Either the payment row and the new paid amount are both written, or
    /// neither is.
    pub async fn apply_payment(
        &self,
        ctx: &CallerContext,
        invoice_id: &str,
        request: PaymentRequest,
    ) -> Result<PaymentReceipt> {
        let guard = self
            .invoices
            .lock(&ctx.tenant_id, invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", invoice_id)))?;

        let mut invoice = guard.invoice().clone();
        let entry = NewPayment {
            amount: request.amount,
            method: request.method,
            paid_at: request.paid_at.unwrap_or_else(|| self.calendar.today()),
            notes: request.notes,
        };

        let payment = match PaymentLedger::apply(&mut invoice, entry) {
            Ok(payment) => payment,
            Err(e) => {
                warn!(
                    tenant_id = %ctx.tenant_id,
                    invoice_id = %invoice_id,
                    amount = %request.amount,
                    balance = %invoice.balance(),
                    error = %e,
                    "Payment rejected"
                );
                return Err(e);
            }
        };

        guard
            .commit(&invoice, InvoiceChange::PaymentAppended(&payment))
            .await?;

        let balance = invoice.balance();
        let settled = PaymentLedger::is_settled(&invoice);

        info!(
            tenant_id = %ctx.tenant_id,
            invoice_id = %invoice_id,
            payment_id = %payment.id,
            amount = %payment.amount,
            method = %payment.method,
            balance = %balance,
            settled,
            "Payment applied"
        );

        Ok(PaymentReceipt {
            invoice,
            payment,
            balance,
            settled,
        })
    }

    /// Payments of an invoice, oldest first
    pub async fn list_payments(&self, ctx: &CallerContext, invoice_id: &str) -> Result<Vec<Payment>> {
        let invoice = self
            .invoices
            .find_by_id(&ctx.tenant_id, invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", invoice_id)))?;

        Ok(invoice.payments)
    }
}
