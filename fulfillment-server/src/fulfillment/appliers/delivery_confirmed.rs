//! DeliveryConfirmed applier
//!
//! Records the delivery event and maintains both quantity roll-ups: the
//! assignment transitions to `delivered` once its share is fully in, and
//! the order steps through in_progress → partially_delivered →
//! fully_delivered as the totals move.

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{
    AssignmentStatus, DeliveryConfirmation, EventPayload, FulfillmentEvent,
};

use super::advance_order_delivery_status;

pub struct DeliveryConfirmedApplier;

impl EventApplier for DeliveryConfirmedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::DeliveryConfirmed {
            assignment_id,
            delivery_id,
            quantity,
            average_unit_weight_kg,
            loss_count,
            note,
        } = &event.payload
        else {
            return Ok(());
        };

        ctx.save_delivery(DeliveryConfirmation {
            delivery_id: delivery_id.clone(),
            assignment_id: assignment_id.clone(),
            order_id: event.order_id.clone(),
            quantity: *quantity,
            average_unit_weight_kg: *average_unit_weight_kg,
            loss_count: *loss_count,
            note: note.clone(),
            quality_passed: None,
            verified_by: None,
            verified_by_name: None,
            verified_at: None,
            delivered_at: event.timestamp,
        });

        let mut assignment = ctx.assignment(assignment_id)?;
        assignment.quantity_delivered += quantity;
        if assignment.quantity_delivered >= assignment.quantity_assigned {
            assignment.status = AssignmentStatus::Delivered;
        }
        assignment.updated_at = event.timestamp;
        ctx.save_assignment(assignment);

        let mut order = ctx.order(&event.order_id)?;
        order.quantity_delivered += quantity;
        advance_order_delivery_status(&mut order);
        order.updated_at = event.timestamp;
        ctx.save_order(order);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::actions::testutil::{assignment, published_order};
    use crate::fulfillment::storage::LedgerStore;
    use crate::fulfillment::traits::CommandContext;
    use shared::fulfillment::{FulfillmentEventType, OrderStatus};

    fn delivery_event(quantity: u32) -> FulfillmentEvent {
        FulfillmentEvent::new(
            1,
            "ord-1".to_string(),
            "user-9".to_string(),
            "K. Osei".to_string(),
            "cmd-1".to_string(),
            FulfillmentEventType::DeliveryConfirmed,
            EventPayload::DeliveryConfirmed {
                assignment_id: "asg-1".to_string(),
                delivery_id: "del-1".to_string(),
                quantity,
                average_unit_weight_kg: Some(1.9),
                loss_count: 2,
                note: None,
            },
        )
    }

    #[test]
    fn partial_delivery_keeps_assignment_in_transit() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let mut order = published_order("ord-1");
        order.status = OrderStatus::InProgress;
        order.quantity_assigned = 1800;
        store.put_order(&txn, &order).unwrap();
        store
            .put_assignment(
                &txn,
                &assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::InTransit),
            )
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        DeliveryConfirmedApplier
            .apply(&mut ctx, &delivery_event(600))
            .unwrap();

        let asg = ctx.assignment("asg-1").unwrap();
        assert_eq!(asg.status, AssignmentStatus::InTransit);
        assert_eq!(asg.quantity_delivered, 600);
        let order = ctx.order("ord-1").unwrap();
        assert_eq!(order.status, OrderStatus::PartiallyDelivered);
        assert_eq!(order.quantity_delivered, 600);
    }

    #[test]
    fn final_delivery_completes_assignment_and_order_roll_up() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let mut order = published_order("ord-1");
        order.status = OrderStatus::InProgress;
        order.quantity_needed = 1800;
        order.quantity_assigned = 1800;
        store.put_order(&txn, &order).unwrap();
        store
            .put_assignment(
                &txn,
                &assignment("asg-1", "ord-1", "farm-1", AssignmentStatus::InTransit),
            )
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        DeliveryConfirmedApplier
            .apply(&mut ctx, &delivery_event(1800))
            .unwrap();

        let asg = ctx.assignment("asg-1").unwrap();
        assert_eq!(asg.status, AssignmentStatus::Delivered);
        let order = ctx.order("ord-1").unwrap();
        assert_eq!(order.status, OrderStatus::FullyDelivered);
        // Invariant: delivered never exceeds assigned
        assert!(order.quantity_delivered <= order.quantity_assigned);
    }
}
