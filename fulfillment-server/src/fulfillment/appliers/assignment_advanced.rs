//! AssignmentAdvanced applier (preparing / ready / in_transit)

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{
    AssignmentStage, AssignmentStatus, EventPayload, FulfillmentEvent,
};

pub struct AssignmentAdvancedApplier;

impl EventApplier for AssignmentAdvancedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::AssignmentAdvanced {
            assignment_id,
            stage,
            readiness_date,
        } = &event.payload
        else {
            return Ok(());
        };

        let mut assignment = ctx.assignment(assignment_id)?;
        assignment.status = match stage {
            AssignmentStage::Preparing => AssignmentStatus::Preparing,
            AssignmentStage::Ready => AssignmentStatus::Ready,
            AssignmentStage::InTransit => AssignmentStatus::InTransit,
        };
        if readiness_date.is_some() {
            assignment.readiness_date = *readiness_date;
        }
        assignment.updated_at = event.timestamp;
        ctx.save_assignment(assignment);
        Ok(())
    }
}
