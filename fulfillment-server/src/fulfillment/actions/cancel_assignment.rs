//! CancelAssignment command handler
//!
//! Cancels an assignment before delivery. Quantity the farm had not yet
//! delivered is released back to the order's unallocated pool.

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::fulfillment::transitions::ensure_assignment_transition;
use shared::fulfillment::{
    AssignmentStatus, EventPayload, FulfillmentEvent, FulfillmentEventType,
};

/// CancelAssignment action
#[derive(Debug, Clone)]
pub struct CancelAssignmentAction {
    pub assignment_id: String,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for CancelAssignmentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let assignment = ctx.assignment(&self.assignment_id)?;

        ensure_assignment_transition(assignment.status, AssignmentStatus::Cancelled)?;

        let seq = ctx.next_sequence();
        let event = FulfillmentEvent::new(
            seq,
            assignment.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::AssignmentCancelled,
            EventPayload::AssignmentCancelled {
                assignment_id: self.assignment_id.clone(),
                released_quantity: assignment.quantity_remaining(),
                reason: self.reason.clone(),
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::actions::testutil::{assignment, officer_metadata};
    use crate::fulfillment::storage::LedgerStore;
    use crate::fulfillment::traits::CommandContext;

    #[tokio::test]
    async fn cancel_pending_assignment_releases_full_quantity() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .put_assignment(
                &txn,
                &assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::Pending),
            )
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let action = CancelAssignmentAction {
            assignment_id: "asg-1".to_string(),
            reason: Some("Farm unreachable".to_string()),
        };
        let events = action
            .execute(&mut ctx, &officer_metadata())
            .await
            .unwrap();
        match &events[0].payload {
            EventPayload::AssignmentCancelled {
                released_quantity, ..
            } => assert_eq!(*released_quantity, 1800),
            other => panic!("Expected AssignmentCancelled, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancel_in_transit_releases_only_undelivered_quantity() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let mut in_transit = assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::InTransit);
        in_transit.quantity_delivered = 600;
        store.put_assignment(&txn, &in_transit).unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let action = CancelAssignmentAction {
            assignment_id: "asg-1".to_string(),
            reason: None,
        };
        let events = action
            .execute(&mut ctx, &officer_metadata())
            .await
            .unwrap();
        match &events[0].payload {
            EventPayload::AssignmentCancelled {
                released_quantity, ..
            } => assert_eq!(*released_quantity, 1200),
            other => panic!("Expected AssignmentCancelled, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancel_after_delivery_fails() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .put_assignment(
                &txn,
                &assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::Delivered),
            )
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let action = CancelAssignmentAction {
            assignment_id: "asg-1".to_string(),
            reason: None,
        };
        let result = action.execute(&mut ctx, &officer_metadata()).await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InvalidStateTransition { .. })
        ));
    }
}
