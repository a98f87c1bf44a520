//! ConfirmDelivery command handler
//!
//! Records one physical delivery event against an in-transit assignment.
//! An assignment may deliver in several partial batches; it transitions
//! to `delivered` when the cumulative quantity reaches its committed
//! share.

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::fulfillment::transitions::ensure_assignment_transition;
use shared::fulfillment::{
    AssignmentStatus, DeliveryInput, EventPayload, FulfillmentEvent, FulfillmentEventType,
};

/// ConfirmDelivery action
#[derive(Debug, Clone)]
pub struct ConfirmDeliveryAction {
    pub assignment_id: String,
    pub delivery: DeliveryInput,
}

#[async_trait]
impl CommandHandler for ConfirmDeliveryAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let assignment = ctx.assignment(&self.assignment_id)?;

        // Deliveries are only accepted from assignments on the road.
        // Report the check as the delivered-transition it gates.
        if assignment.status != AssignmentStatus::InTransit {
            ensure_assignment_transition(assignment.status, AssignmentStatus::Delivered)?;
        }

        if self.delivery.quantity == 0 {
            return Err(FulfillmentError::Validation(
                "delivery quantity must be positive".to_string(),
            ));
        }
        let remaining = assignment.quantity_remaining();
        if self.delivery.quantity > remaining {
            return Err(FulfillmentError::Validation(format!(
                "delivery of {} exceeds undelivered remainder {} of assignment {}",
                self.delivery.quantity, remaining, assignment.assignment_number
            )));
        }
        if self.delivery.loss_count > self.delivery.quantity {
            return Err(FulfillmentError::Validation(format!(
                "loss_count {} exceeds delivered quantity {}",
                self.delivery.loss_count, self.delivery.quantity
            )));
        }
        if let Some(weight) = self.delivery.average_unit_weight_kg
            && (!weight.is_finite() || weight <= 0.0)
        {
            return Err(FulfillmentError::Validation(
                "average_unit_weight_kg must be positive".to_string(),
            ));
        }

        let seq = ctx.next_sequence();
        let event = FulfillmentEvent::new(
            seq,
            assignment.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::DeliveryConfirmed,
            EventPayload::DeliveryConfirmed {
                assignment_id: self.assignment_id.clone(),
                delivery_id: uuid::Uuid::new_v4().to_string(),
                quantity: self.delivery.quantity,
                average_unit_weight_kg: self.delivery.average_unit_weight_kg,
                loss_count: self.delivery.loss_count,
                note: self.delivery.note.clone(),
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

    fn action(quantity: u32, loss_count: u32) -> ConfirmDeliveryAction {
        ConfirmDeliveryAction {
            assignment_id: "asg-1".to_string(),
            delivery: DeliveryInput {
                quantity,
                average_unit_weight_kg: Some(1.9),
                loss_count,
                note: None,
            },
        }
    }

    #[tokio::test]
    async fn confirm_delivery_from_in_transit() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .put_assignment(
                &txn,
                &assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::InTransit),
            )
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let events = action(1800, 5)
            .execute(&mut ctx, &farm_metadata("farm-1"))
            .await
            .unwrap();
        match &events[0].payload {
            EventPayload::DeliveryConfirmed {
                quantity,
                loss_count,
                ..
            } => {
                assert_eq!(*quantity, 1800);
                assert_eq!(*loss_count, 5);
            }
            other => panic!("Expected DeliveryConfirmed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn delivery_before_transit_fails() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .put_assignment(
                &txn,
                &assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::Preparing),
            )
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let result = action(500, 0)
            .execute(&mut ctx, &farm_metadata("farm-1"))
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn over_delivery_fails() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let mut in_transit = assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::InTransit);
        in_transit.quantity_delivered = 1500; // 300 remaining of 1800
        store.put_assignment(&txn, &in_transit).unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let result = action(301, 0)
            .execute(&mut ctx, &farm_metadata("farm-1"))
            .await;
        assert!(matches!(result, Err(FulfillmentError::Validation(_))));
    }

    #[tokio::test]
    async fn loss_exceeding_quantity_fails() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .put_assignment(
                &txn,
                &assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::InTransit),
            )
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let result = action(100, 101)
            .execute(&mut ctx, &farm_metadata("farm-1"))
            .await;
        assert!(matches!(result, Err(FulfillmentError::Validation(_))));
    }
}
