mod billing_event;

pub use billing_event::BillingEvent;
