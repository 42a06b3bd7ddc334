use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a payment was received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Stripe,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Transfer => "TRANSFER",
            PaymentMethod::Stripe => "STRIPE",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CASH" => Ok(PaymentMethod::Cash),
            "CARD" => Ok(PaymentMethod::Card),
            "TRANSFER" => Ok(PaymentMethod::Transfer),
            "STRIPE" => Ok(PaymentMethod::Stripe),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

/// Money applied against an invoice.
///
/// Append-only: once recorded a payment is never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique payment ID (UUID)
    pub id: String,

    /// Invoice this payment settles (part of)
    pub invoice_id: String,

    /// Amount applied, always > 0
    pub amount: Decimal,

    pub method: PaymentMethod,

    /// Calendar date the money was received
    pub paid_at: NaiveDate,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Request to record a payment
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Defaults to today in the business calendar
    #[serde(default)]
    pub paid_at: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}
