//! DeliveryVerified applier
//!
//! Seals the delivery record (immutable from here on) and moves the
//! assignment to `verified` once every delivery of a fully delivered
//! assignment has been inspected.

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{AssignmentStatus, EventPayload, FulfillmentEvent};

pub struct DeliveryVerifiedApplier;

impl EventApplier for DeliveryVerifiedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::DeliveryVerified {
            assignment_id,
            delivery_id,
            quality_passed,
            ..
        } = &event.payload
        else {
            return Ok(());
        };

        let mut delivery = ctx.delivery(delivery_id)?;
        delivery.quality_passed = Some(*quality_passed);
        delivery.verified_by = Some(event.actor_id.clone());
        delivery.verified_by_name = Some(event.actor_name.clone());
        delivery.verified_at = Some(event.timestamp);
        ctx.save_delivery(delivery);

        let assignment = ctx.assignment(assignment_id)?;
        if assignment.status == AssignmentStatus::Delivered {
            let all_verified = ctx
                .deliveries_for_assignment(assignment_id)?
                .iter()
                .all(|d| d.is_verified());
            if all_verified {
                let mut assignment = ctx.assignment(assignment_id)?;
                assignment.status = AssignmentStatus::Verified;
                assignment.updated_at = event.timestamp;
                ctx.save_assignment(assignment);
            }
        }
        Ok(())
    }
}
