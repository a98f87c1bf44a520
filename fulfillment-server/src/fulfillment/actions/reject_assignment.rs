//! RejectAssignment command handler
//!
//! A farm declines an assignment. Only legal while still `pending`;
//! once the farm has accepted, the path out is explicit cancellation.

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::fulfillment::transitions::ensure_assignment_transition;
use shared::fulfillment::{
    AssignmentStatus, EventPayload, FulfillmentEvent, FulfillmentEventType,
};

/// RejectAssignment action
#[derive(Debug, Clone)]
pub struct RejectAssignmentAction {
    pub assignment_id: String,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for RejectAssignmentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let assignment = ctx.assignment(&self.assignment_id)?;

        ensure_assignment_transition(assignment.status, AssignmentStatus::Rejected)?;

        let seq = ctx.next_sequence();
        let event = FulfillmentEvent::new(
            seq,
            assignment.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::AssignmentRejected,
            EventPayload::AssignmentRejected {
                assignment_id: self.assignment_id.clone(),
                reason: self.reason.clone(),
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::actions::testutil::{assignment, farm_metadata};
    use crate::fulfillment::storage::LedgerStore;
    use crate::fulfillment::traits::CommandContext;

    #[tokio::test]
    async fn reject_pending_assignment() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .put_assignment(
                &txn,
                &assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::Pending),
            )
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let action = RejectAssignmentAction {
            assignment_id: "asg-1".to_string(),
            reason: Some("Flock not ready".to_string()),
        };
        let events = action
            .execute(&mut ctx, &farm_metadata("farm-1"))
            .await
            .unwrap();
        assert_eq!(events[0].event_type, FulfillmentEventType::AssignmentRejected);
    }

    #[tokio::test]
    async fn reject_in_preparing_state_fails_and_names_states() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .put_assignment(
                &txn,
                &assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::Preparing),
            )
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let action = RejectAssignmentAction {
            assignment_id: "asg-1".to_string(),
            reason: None,
        };
        let err = action
            .execute(&mut ctx, &farm_metadata("farm-1"))
            .await
            .unwrap_err();
        match err {
            FulfillmentError::InvalidStateTransition {
                entity,
                from,
                attempted,
            } => {
                assert_eq!(entity, "assignment");
                assert_eq!(from, "PREPARING");
                assert_eq!(attempted, "REJECTED");
            }
            other => panic!("Expected InvalidStateTransition, got {:?}", other),
        }
    }
}
