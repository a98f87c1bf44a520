//! AssignmentCancelled applier
//!
//! Returns the undelivered share to the order. Goods already delivered
//! stay counted, so cancelling a partially delivered in-transit
//! assignment can complete the order's delivery roll-up.

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{
    AssignmentStatus, EventPayload, FulfillmentEvent, OrderStatus,
};

use super::advance_order_delivery_status;

pub struct AssignmentCancelledApplier;

impl EventApplier for AssignmentCancelledApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::AssignmentCancelled {
            assignment_id,
            released_quantity,
            reason,
        } = &event.payload
        else {
            return Ok(());
        };

        let mut assignment = ctx.assignment(assignment_id)?;
        assignment.status = AssignmentStatus::Cancelled;
        assignment.cancel_reason = reason.clone();
        assignment.updated_at = event.timestamp;
        ctx.save_assignment(assignment);

        let mut order = ctx.order(&event.order_id)?;
        order.quantity_assigned = order.quantity_assigned.saturating_sub(*released_quantity);
        if order.status == OrderStatus::Assigned {
            order.status = OrderStatus::Assigning;
        }
        advance_order_delivery_status(&mut order);
        order.updated_at = event.timestamp;
        ctx.save_order(order);
        Ok(())
    }
}
