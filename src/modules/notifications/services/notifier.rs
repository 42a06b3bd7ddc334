use async_trait::async_trait;
use std::sync::Arc;

use crate::core::Result;
use crate::modules::notifications::models::BillingEvent;

/// Collaborator told about billing transitions.
///
/// Delivery is outside the billing rules: a failing notifier never undoes
/// the transition that triggered it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: BillingEvent) -> Result<()>;
}

/// Default notifier: records the event in the log for an external sender to pick up
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: BillingEvent) -> Result<()> {
        tracing::info!(
            event = event.name(),
            tenant_id = %event.tenant_id(),
            number = %event.document_number(),
            payload = %serde_json::to_string(&event)?,
            "Billing notification"
        );
        Ok(())
    }
}

/// Hand `event` to `notifier` without waiting for it
pub fn dispatch(notifier: Arc<dyn Notifier>, event: BillingEvent) {
    tokio::spawn(async move {
        let name = event.name();
        if let Err(e) = notifier.notify(event).await {
            tracing::warn!(event = name, error = %e, "Notification failed");
        }
    });
}
