//! AcceptAssignment command handler
//!
//! A farm commits to its assigned share.

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::fulfillment::transitions::ensure_assignment_transition;
use shared::fulfillment::{
    AssignmentStatus, EventPayload, FulfillmentEvent, FulfillmentEventType,
};

/// AcceptAssignment action
#[derive(Debug, Clone)]
pub struct AcceptAssignmentAction {
    pub assignment_id: String,
}

#[async_trait]
impl CommandHandler for AcceptAssignmentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let assignment = ctx.assignment(&self.assignment_id)?;

        ensure_assignment_transition(assignment.status, AssignmentStatus::Accepted)?;

        let seq = ctx.next_sequence();
        let event = FulfillmentEvent::new(
            seq,
            assignment.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::AssignmentAccepted,
            EventPayload::AssignmentAccepted {
                assignment_id: self.assignment_id.clone(),
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
    async fn accept_pending_assignment() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .put_assignment(
                &txn,
                &assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::Pending),
            )
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let action = AcceptAssignmentAction {
            assignment_id: "asg-1".to_string(),
        };
        let events = action
            .execute(&mut ctx, &farm_metadata("farm-1"))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, FulfillmentEventType::AssignmentAccepted);
        assert_eq!(events[0].order_id, "ord-1");
    }

    #[tokio::test]
    async fn accept_twice_fails() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .put_assignment(
                &txn,
                &assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::Accepted),
            )
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let action = AcceptAssignmentAction {
            assignment_id: "asg-1".to_string(),
        };
        let result = action.execute(&mut ctx, &farm_metadata("farm-1")).await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn accept_missing_assignment_fails() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let action = AcceptAssignmentAction {
            assignment_id: "nope".to_string(),
        };
        let result = action.execute(&mut ctx, &farm_metadata("farm-1")).await;
        assert!(matches!(
            result,
            Err(FulfillmentError::AssignmentNotFound(_))
        ));
    }
}
