//! CreateOrder command handler
//!
//! Creates a purchase order in `draft`. The order number is allocated by
//! the manager inside the command transaction and handed in here.

use async_trait::async_trait;

use crate::fulfillment::money::{money_eq, to_decimal, validate_amount};
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use rust_decimal::Decimal;
use shared::fulfillment::{
    EventPayload, FulfillmentEvent, FulfillmentEventType, ProductType,
};

/// CreateOrder action
#[derive(Debug, Clone)]
pub struct CreateOrderAction {
    pub product_type: ProductType,
    pub quantity_needed: u32,
    pub unit_price: f64,
    pub total_budget: f64,
    pub delivery_deadline: i64,
    pub preferred_region: Option<String>,
    /// Pre-allocated by the manager within the command transaction
    pub order_number: String,
}

#[async_trait]
impl CommandHandler for CreateOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        if self.quantity_needed == 0 {
            return Err(FulfillmentError::Validation(
                "quantity_needed must be positive".to_string(),
            ));
        }
        validate_amount(self.unit_price, "unit_price").map_err(FulfillmentError::Validation)?;
        if self.unit_price <= 0.0 {
            return Err(FulfillmentError::Validation(
                "unit_price must be positive".to_string(),
            ));
        }
        if !self.total_budget.is_finite() || self.total_budget <= 0.0 {
            return Err(FulfillmentError::Validation(format!(
                "total_budget must be positive, got {}",
                self.total_budget
            )));
        }

        // The budget must cover the full quantity at the offered price
        let required = to_decimal(self.unit_price) * Decimal::from(self.quantity_needed);
        let budget = to_decimal(self.total_budget);
        if budget < required && !money_eq(self.total_budget, crate::fulfillment::money::to_f64(required)) {
            return Err(FulfillmentError::Validation(format!(
                "total_budget {:.2} does not cover {} units at {:.2}",
                self.total_budget, self.quantity_needed, self.unit_price
            )));
        }

        if self.delivery_deadline <= metadata.timestamp {
            return Err(FulfillmentError::Validation(
                "delivery_deadline must be in the future".to_string(),
            ));
        }

        let seq = ctx.next_sequence();
        let order_id = uuid::Uuid::new_v4().to_string();

        let event = FulfillmentEvent::new(
            seq,
            order_id,
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::OrderCreated,
            EventPayload::OrderCreated {
                order_number: self.order_number.clone(),
                product_type: self.product_type,
                quantity_needed: self.quantity_needed,
                unit_price: self.unit_price,
                total_budget: self.total_budget,
                delivery_deadline: self.delivery_deadline,
                preferred_region: self.preferred_region.clone(),
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::actions::testutil::officer_metadata;
    use crate::fulfillment::storage::LedgerStore;
    use crate::fulfillment::traits::CommandContext;

    fn action() -> CreateOrderAction {
        CreateOrderAction {
            product_type: ProductType::Broiler,
            quantity_needed: 5000,
            unit_price: 85.0,
            total_budget: 500_000.0,
            delivery_deadline: shared::util::now_millis() + 86_400_000,
            preferred_region: Some("Ashanti".to_string()),
            order_number: "PO-20260101-1001".to_string(),
        }
    }

    #[tokio::test]
    async fn create_order_emits_event() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let events = action().execute(&mut ctx, &officer_metadata()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, FulfillmentEventType::OrderCreated);
        match &events[0].payload {
            EventPayload::OrderCreated {
                order_number,
                quantity_needed,
                ..
            } => {
                assert_eq!(order_number, "PO-20260101-1001");
                assert_eq!(*quantity_needed, 5000);
            }
            other => panic!("Expected OrderCreated payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn zero_quantity_fails() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let mut bad = action();
        bad.quantity_needed = 0;
        let result = bad.execute(&mut ctx, &officer_metadata()).await;
        assert!(matches!(result, Err(FulfillmentError::Validation(_))));
    }

    #[tokio::test]
    async fn insufficient_budget_fails() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let mut bad = action();
        bad.total_budget = 100_000.0; // needs 425,000
        let result = bad.execute(&mut ctx, &officer_metadata()).await;
        assert!(matches!(result, Err(FulfillmentError::Validation(_))));
    }

    #[tokio::test]
    async fn past_deadline_fails() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let mut bad = action();
        bad.delivery_deadline = shared::util::now_millis() - 1000;
        let result = bad.execute(&mut ctx, &officer_metadata()).await;
        assert!(matches!(result, Err(FulfillmentError::Validation(_))));
    }

    #[tokio::test]
    async fn non_finite_price_fails() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let mut bad = action();
        bad.unit_price = f64::NAN;
        let result = bad.execute(&mut ctx, &officer_metadata()).await;
        assert!(matches!(result, Err(FulfillmentError::Validation(_))));
    }
}
