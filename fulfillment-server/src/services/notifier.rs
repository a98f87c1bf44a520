//! Notification dispatcher collaborator
//!
//! Called after each successful commit, fire-and-forget: a notification
//! failure is logged and never rolls back the committed transition.

use shared::fulfillment::FulfillmentEvent;

/// Outbound notification sink (SMS/email fan-out lives behind this)
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &FulfillmentEvent);
}

/// Default sink: structured log line per event
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn notify(&self, event: &FulfillmentEvent) {
        tracing::info!(
            event_type = %event.event_type,
            order_id = %event.order_id,
            sequence = event.sequence,
            "Dispatching notification"
        );
    }
}
