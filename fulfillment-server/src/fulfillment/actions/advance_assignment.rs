//! Assignment progress handler (StartPreparing / MarkReady / StartTransit)
//!
//! The farm-side chain `accepted → preparing → ready → in_transit`.
//! Entering `preparing` requires a farm-supplied readiness date; the
//! later stages require that date to already be on file.

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::fulfillment::transitions::ensure_assignment_transition;
use shared::fulfillment::{
    AssignmentStage, AssignmentStatus, EventPayload, FulfillmentEvent, FulfillmentEventType,
};

/// AdvanceAssignment action
#[derive(Debug, Clone)]
pub struct AdvanceAssignmentAction {
    pub assignment_id: String,
    pub stage: AssignmentStage,
    /// Required when entering `preparing`
    pub readiness_date: Option<i64>,
}

fn target_status(stage: AssignmentStage) -> AssignmentStatus {
    match stage {
        AssignmentStage::Preparing => AssignmentStatus::Preparing,
        AssignmentStage::Ready => AssignmentStatus::Ready,
        AssignmentStage::InTransit => AssignmentStatus::InTransit,
    }
}

#[async_trait]
impl CommandHandler for AdvanceAssignmentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let assignment = ctx.assignment(&self.assignment_id)?;

        ensure_assignment_transition(assignment.status, target_status(self.stage))?;

        match self.stage {
            AssignmentStage::Preparing => {
                let readiness = self.readiness_date.ok_or_else(|| {
                    FulfillmentError::Validation(
                        "readiness_date is required to start preparing".to_string(),
                    )
                })?;
                if readiness <= metadata.timestamp {
                    return Err(FulfillmentError::Validation(
                        "readiness_date must be in the future".to_string(),
                    ));
                }
            }
            AssignmentStage::Ready | AssignmentStage::InTransit => {
                if assignment.readiness_date.is_none() {
                    return Err(FulfillmentError::Validation(
                        "assignment has no readiness date on file".to_string(),
                    ));
                }
            }
        }

        let seq = ctx.next_sequence();
        let event = FulfillmentEvent::new(
            seq,
            assignment.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::AssignmentAdvanced,
            EventPayload::AssignmentAdvanced {
                assignment_id: self.assignment_id.clone(),
                stage: self.stage,
                readiness_date: self.readiness_date,
            },
        );

        Ok(vec![event])
    }
}
