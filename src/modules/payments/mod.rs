// Payments module: append-only payment ledger per invoice

pub mod controllers;
pub mod models;
pub mod services;

pub use models::{Payment, PaymentMethod};
pub use services::{PaymentLedger, PaymentReceipt, PaymentService};
