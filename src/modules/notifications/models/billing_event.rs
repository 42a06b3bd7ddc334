use rust_decimal::Decimal;
use serde::Serialize;

/// Transitions that the surrounding application reacts to (email, PDF)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BillingEvent {
    /// DRAFT → SENT: the quote should be emailed to the client
    QuoteSent {
        tenant_id: String,
        quote_id: String,
        number: String,
        client_id: String,
        total: Decimal,
    },

    /// PENDING → PAID: a receipt may be sent
    InvoicePaid {
        tenant_id: String,
        invoice_id: String,
        number: String,
        client_id: String,
        total: Decimal,
    },
}

impl BillingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BillingEvent::QuoteSent { .. } => "quote_sent",
            BillingEvent::InvoicePaid { .. } => "invoice_paid",
        }
    }

    pub fn tenant_id(&self) -> &str {
        match self {
            BillingEvent::QuoteSent { tenant_id, .. } | BillingEvent::InvoicePaid { tenant_id, .. } => {
                tenant_id
            }
        }
    }

    /// Number of the quote or invoice concerned
    pub fn document_number(&self) -> &str {
        match self {
            BillingEvent::QuoteSent { number, .. } | BillingEvent::InvoicePaid { number, .. } => {
                number
            }
        }
    }
}
