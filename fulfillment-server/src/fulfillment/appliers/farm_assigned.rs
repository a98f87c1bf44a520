//! FarmAssigned applier
//!
//! Creates the pending assignment and maintains the order's allocation
//! roll-up: first assignment moves the order into `assigning`, covering
//! the full quantity moves it to `assigned`.

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{
    AssignmentSnapshot, AssignmentStatus, EventPayload, FulfillmentEvent, OrderStatus,
};

pub struct FarmAssignedApplier;

impl EventApplier for FarmAssignedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::FarmAssigned {
            assignment_id,
            assignment_number,
            farm_id,
            farm_name,
            settlement_account,
            quantity,
            unit_price,
            ..
        } = &event.payload
        else {
            return Ok(());
        };

        ctx.save_assignment(AssignmentSnapshot {
            assignment_id: assignment_id.clone(),
            assignment_number: assignment_number.clone(),
            order_id: event.order_id.clone(),
            farm_id: farm_id.clone(),
            farm_name: farm_name.clone(),
            settlement_account: settlement_account.clone(),
            quantity_assigned: *quantity,
            quantity_delivered: 0,
            unit_price: *unit_price,
            status: AssignmentStatus::Pending,
            readiness_date: None,
            reject_reason: None,
            cancel_reason: None,
            created_at: event.timestamp,
            updated_at: event.timestamp,
        });

        let mut order = ctx.order(&event.order_id)?;
        order.quantity_assigned += quantity;
        if order.status == OrderStatus::Published {
            order.status = OrderStatus::Assigning;
        }
        if order.status == OrderStatus::Assigning && order.quantity_remaining() == 0 {
            order.status = OrderStatus::Assigned;
        }
        order.updated_at = event.timestamp;
        ctx.save_order(order);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::actions::testutil::published_order;
    use crate::fulfillment::storage::LedgerStore;
    use crate::fulfillment::traits::CommandContext;
    use shared::fulfillment::FulfillmentEventType;

    fn assigned_event(quantity: u32) -> FulfillmentEvent {
        FulfillmentEvent::new(
            1,
            "ord-1".to_string(),
            "officer-1".to_string(),
            "A. Mensah".to_string(),
            "cmd-1".to_string(),
            FulfillmentEventType::FarmAssigned,
            EventPayload::FarmAssigned {
                assignment_id: "asg-1".to_string(),
                assignment_number: "PO-20260101-1001-A1".to_string(),
                farm_id: "farm-1".to_string(),
                farm_name: "Sunrise Farm".to_string(),
                settlement_account: Some("MM-1".to_string()),
                quantity,
                unit_price: 85.0,
                auto_assigned: false,
            },
        )
    }

    #[test]
    fn partial_allocation_moves_order_to_assigning() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store.put_order(&txn, &published_order("ord-1")).unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        FarmAssignedApplier
            .apply(&mut ctx, &assigned_event(3000))
            .unwrap();

        let order = ctx.order("ord-1").unwrap();
        assert_eq!(order.status, OrderStatus::Assigning);
        assert_eq!(order.quantity_assigned, 3000);
        let assignment = ctx.assignment("asg-1").unwrap();
        assert_eq!(assignment.status, AssignmentStatus::Pending);
        assert_eq!(assignment.quantity_assigned, 3000);
    }

    #[test]
    fn full_allocation_moves_order_to_assigned() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store.put_order(&txn, &published_order("ord-1")).unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        FarmAssignedApplier
            .apply(&mut ctx, &assigned_event(5000))
            .unwrap();

        let order = ctx.order("ord-1").unwrap();
        assert_eq!(order.status, OrderStatus::Assigned);
        assert_eq!(order.quantity_remaining(), 0);
    }
}
