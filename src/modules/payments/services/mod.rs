pub mod payment_ledger;
pub mod payment_service;

pub use payment_ledger::{NewPayment, PaymentLedger};
pub use payment_service::{PaymentReceipt, PaymentService};
