//! CancelOrder command handler
//!
//! Cancels an order. Assignments still `pending` are cancelled with it;
//! an assignment a farm has already accepted blocks cancellation and
//! must be transitioned explicitly first (no cascade past acceptance).

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::fulfillment::transitions::ensure_order_transition;
use shared::fulfillment::{
    AssignmentStatus, EventPayload, FulfillmentEvent, FulfillmentEventType, OrderStatus,
};

/// CancelOrder action
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for CancelOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let order = ctx.order(&self.order_id)?;

        ensure_order_transition(order.status, OrderStatus::Cancelled)?;

        let assignments = ctx.assignments_for_order(&self.order_id)?;
        let blocking: Vec<&str> = assignments
            .iter()
            .filter(|a| {
                !matches!(
                    a.status,
                    AssignmentStatus::Pending
                        | AssignmentStatus::Rejected
                        | AssignmentStatus::Cancelled
                )
            })
            .map(|a| a.assignment_number.as_str())
            .collect();
        if !blocking.is_empty() {
            return Err(FulfillmentError::Validation(format!(
                "accepted assignments must be cancelled explicitly first: {}",
                blocking.join(", ")
            )));
        }

        let mut events = Vec::new();
        for assignment in assignments
            .iter()
            .filter(|a| a.status == AssignmentStatus::Pending)
        {
            let seq = ctx.next_sequence();
            events.push(FulfillmentEvent::new(
                seq,
                self.order_id.clone(),
                metadata.actor.id.clone(),
                metadata.actor.name.clone(),
                metadata.command_id.clone(),
                FulfillmentEventType::AssignmentCancelled,
                EventPayload::AssignmentCancelled {
                    assignment_id: assignment.assignment_id.clone(),
                    released_quantity: assignment.quantity_remaining(),
                    reason: Some("order cancelled".to_string()),
                },
            ));
        }

        let seq = ctx.next_sequence();
        events.push(FulfillmentEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::OrderCancelled,
            EventPayload::OrderCancelled {
                reason: self.reason.clone(),
            },
        ));

        Ok(events)
    }
}
