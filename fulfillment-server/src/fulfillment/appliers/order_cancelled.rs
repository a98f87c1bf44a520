//! OrderCancelled applier

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{EventPayload, FulfillmentEvent, OrderStatus};

pub struct OrderCancelledApplier;

impl EventApplier for OrderCancelledApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let mut order = ctx.order(&event.order_id)?;
        order.status = OrderStatus::Cancelled;
        if let EventPayload::OrderCancelled { reason } = &event.payload {
            order.cancel_reason = reason.clone();
        }
        order.updated_at = event.timestamp;
        ctx.save_order(order);
        Ok(())
    }
}
