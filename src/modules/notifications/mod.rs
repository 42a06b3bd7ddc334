// Notifications module: fire-and-forget hooks for the email/PDF senders

pub mod models;
pub mod services;

pub use models::BillingEvent;
pub use services::{dispatch, LogNotifier, Notifier};
