//! PublishOrder command handler
//!
//! Publishes a draft order, opening it to farm assignment.

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::fulfillment::transitions::ensure_order_transition;
use shared::fulfillment::{EventPayload, FulfillmentEvent, FulfillmentEventType, OrderStatus};

/// PublishOrder action
#[derive(Debug, Clone)]
pub struct PublishOrderAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for PublishOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let order = ctx.order(&self.order_id)?;

        ensure_order_transition(order.status, OrderStatus::Published)?;

        let seq = ctx.next_sequence();
        let event = FulfillmentEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::OrderPublished,
            EventPayload::OrderPublished {},
        );

        Ok(vec![event])
    }
}
