//! AssignmentAccepted applier
//!
//! Acceptance of a fully allocated order starts progress; while the
//! order is still collecting farms it stays in `assigning`.

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{
    AssignmentStatus, EventPayload, FulfillmentEvent, OrderStatus,
};

pub struct AssignmentAcceptedApplier;

impl EventApplier for AssignmentAcceptedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::AssignmentAccepted { assignment_id } = &event.payload else {
            return Ok(());
        };

        let mut assignment = ctx.assignment(assignment_id)?;
        assignment.status = AssignmentStatus::Accepted;
        assignment.updated_at = event.timestamp;
        ctx.save_assignment(assignment);

        let mut order = ctx.order(&event.order_id)?;
        if order.status == OrderStatus::Assigned {
            order.status = OrderStatus::InProgress;
            order.updated_at = event.timestamp;
            ctx.save_order(order);
        }
        Ok(())
    }
}
