//! OrderCompleted applier

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{FulfillmentEvent, OrderStatus};

pub struct OrderCompletedApplier;

impl EventApplier for OrderCompletedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let mut order = ctx.order(&event.order_id)?;
        order.status = OrderStatus::Completed;
        order.updated_at = event.timestamp;
        ctx.save_order(order);
        Ok(())
    }
}
