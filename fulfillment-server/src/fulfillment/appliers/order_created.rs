//! OrderCreated applier - materializes a draft order snapshot

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{EventPayload, FulfillmentEvent, OrderSnapshot, OrderStatus};

pub struct OrderCreatedApplier;

impl EventApplier for OrderCreatedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::OrderCreated {
            order_number,
            product_type,
            quantity_needed,
            unit_price,
            total_budget,
            delivery_deadline,
            preferred_region,
        } = &event.payload
        else {
            return Ok(());
        };

        ctx.save_order(OrderSnapshot {
            order_id: event.order_id.clone(),
            order_number: order_number.clone(),
            product_type: *product_type,
            quantity_needed: *quantity_needed,
            unit_price: *unit_price,
            total_budget: *total_budget,
            delivery_deadline: *delivery_deadline,
            preferred_region: preferred_region.clone(),
            status: OrderStatus::Draft,
            quantity_assigned: 0,
            quantity_delivered: 0,
            created_by: event.actor_id.clone(),
            cancel_reason: None,
            created_at: event.timestamp,
            updated_at: event.timestamp,
        });
        Ok(())
    }
}
