// Payment ledger rules.
//
// Pure functions over an invoice already held under its row lock; the
// service layer is responsible for loading it that way and committing the
// appended payment together with the new paid amount.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::money::{ensure_storable, format_amount, payment_tolerance, STORAGE_SCALE};
use crate::core::{AppError, Result};
use crate::modules::invoices::models::{Invoice, InvoiceStatus};
use crate::modules::payments::models::{Payment, PaymentMethod};

/// A payment about to be recorded
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub paid_at: NaiveDate,
    pub notes: Option<String>,
}

pub struct PaymentLedger;

impl PaymentLedger {
    /// Append a payment to `invoice` and recompute its paid amount from the ledger.
    ///
    /// Amounts up to one cent over the balance are accepted and recorded as
    /// the exact balance, so the paid amount never exceeds the total. The
    /// recorded amount must fit the payments column (6 decimal places). On
    /// rejection `invoice` is left untouched.
    pub fn apply(invoice: &mut Invoice, entry: NewPayment) -> Result<Payment> {
        if invoice.status != InvoiceStatus::Pending {
            return Err(AppError::state(format!(
                "Invoice {} is {}; payments are only accepted on PENDING invoices",
                invoice.number, invoice.status
            )));
        }

        let balance = invoice.balance();

        if entry.amount <= Decimal::ZERO {
            return Err(AppError::balance("amount must be greater than 0", balance));
        }

        if balance <= Decimal::ZERO {
            return Err(AppError::balance(
                format!("Invoice {} has no pending balance", invoice.number),
                balance,
            ));
        }

        if entry.amount > balance + payment_tolerance() {
            return Err(AppError::balance(
                format!("payment exceeds pending balance of {}", format_amount(balance)),
                balance,
            ));
        }

        // Recorded at the exact balance when within tolerance
        let amount = entry.amount.min(balance);
        ensure_storable(amount, STORAGE_SCALE, "Payment amount")?;

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            invoice_id: invoice.id.clone(),
            amount,
            method: entry.method,
            paid_at: entry.paid_at,
            notes: entry.notes.filter(|n| !n.trim().is_empty()),
            created_at: Utc::now(),
        };

        invoice.payments.push(payment.clone());
        invoice.paid_amount = invoice.recorded_payments();
        invoice.updated_at = payment.created_at;

        Ok(payment)
    }

    /// True once the recorded payments cover the whole total
    pub fn is_settled(invoice: &Invoice) -> bool {
        invoice.balance() <= Decimal::ZERO
    }
}
