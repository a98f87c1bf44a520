//! AssignmentRejected applier
//!
//! Releases the rejected share back to the order's unallocated pool.

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{
    AssignmentStatus, EventPayload, FulfillmentEvent, OrderStatus,
};

pub struct AssignmentRejectedApplier;

impl EventApplier for AssignmentRejectedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::AssignmentRejected {
            assignment_id,
            reason,
        } = &event.payload
        else {
            return Ok(());
        };

        let mut assignment = ctx.assignment(assignment_id)?;
        let released = assignment.quantity_assigned;
        assignment.status = AssignmentStatus::Rejected;
        assignment.reject_reason = reason.clone();
        assignment.updated_at = event.timestamp;
        ctx.save_assignment(assignment);

        let mut order = ctx.order(&event.order_id)?;
        order.quantity_assigned = order.quantity_assigned.saturating_sub(released);
        if order.status == OrderStatus::Assigned {
            order.status = OrderStatus::Assigning;
        }
        order.updated_at = event.timestamp;
        ctx.save_order(order);
        Ok(())
    }
}
