//! AutoAssign command handler
//!
//! Runs the recommendation engine against the order's remaining quantity
//! and commits one assignment per allocated farm. The farm pool and
//! distress scores are fetched by the manager and injected here; the
//! order state they are scored against is read inside the command
//! transaction, so two racing auto-assignments serialize on the order
//! lease and the second sees the first's allocations.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::fulfillment::transitions::ensure_order_transition;
use crate::recommendation::{recommend, RecommendationConfig};
use shared::farm::FarmProfile;
use shared::fulfillment::{FulfillmentEvent, OrderStatus};

use super::assign_farm::AssignFarmAction;

/// AutoAssign action
pub struct AutoAssignAction {
    pub order_id: String,
    /// Eligible farm pool from the directory
    pub pool: Vec<FarmProfile>,
    /// farm id → distress score
    pub distress: HashMap<String, u8>,
    pub config: RecommendationConfig,
    /// Per-command override of the configured farm cap
    pub max_farms: Option<usize>,
}

#[async_trait]
impl CommandHandler for AutoAssignAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let order = ctx.order(&self.order_id)?;

        if order.status != OrderStatus::Assigning {
            ensure_order_transition(order.status, OrderStatus::Assigning)?;
        }
        if order.quantity_remaining() == 0 {
            return Err(FulfillmentError::Validation(format!(
                "order {} is already fully allocated",
                order.order_number
            )));
        }

        // Farms already holding an active assignment never re-enter the pool
        let mut pool = Vec::with_capacity(self.pool.len());
        for farm in &self.pool {
            if ctx
                .active_assignment_for_farm(&self.order_id, &farm.farm_id)?
                .is_none()
            {
                pool.push(farm.clone());
            }
        }

        let mut config = self.config.clone();
        if let Some(max_farms) = self.max_farms {
            config.max_farms = max_farms;
        }

        let outcome = recommend(&order, &pool, &self.distress, &config);
        if outcome.quantity_allocated == 0 {
            return Err(FulfillmentError::Validation(
                "no eligible farm has available inventory for this order".to_string(),
            ));
        }

        let base_seq = ctx.assignment_count_for_order(&self.order_id)?;
        let mut events = Vec::new();
        for (offset, allocation) in outcome
            .allocations
            .iter()
            .filter(|a| a.quantity_allocated > 0)
            .enumerate()
        {
            let farm = pool
                .iter()
                .find(|f| f.farm_id == allocation.farm_id)
                .expect("allocation references a farm from the filtered pool");
            events.push(AssignFarmAction::build_event(
                ctx,
                metadata,
                &self.order_id,
                farm,
                allocation.quantity_allocated,
                order.unit_price,
                true,
                base_seq + offset + 1,
            )?);
        }

        ctx.set_recommendation(outcome);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::actions::testutil::{officer_metadata, published_order};
    use crate::fulfillment::storage::LedgerStore;
    use crate::fulfillment::traits::CommandContext;
    use shared::farm::ApprovalStatus;
    use shared::fulfillment::{EventPayload, ProductType};

    fn profile(farm_id: &str, inventory: u32) -> FarmProfile {
        FarmProfile {
            farm_id: farm_id.to_string(),
            farm_name: format!("Farm {}", farm_id),
            region: "Ashanti".to_string(),
            approval_status: ApprovalStatus::Approved,
            production_types: vec![ProductType::Broiler],
            business_registered: true,
            settlement_account: Some(format!("MM-{}", farm_id)),
            current_inventory: inventory,
        }
    }

    fn action(pool: Vec<FarmProfile>) -> AutoAssignAction {
        AutoAssignAction {
            order_id: "ord-1".to_string(),
            pool,
            distress: HashMap::new(),
            config: RecommendationConfig::default(),
            max_farms: None,
        }
    }

    #[tokio::test]
    async fn allocates_greedily_across_farms() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store.put_order(&txn, &published_order("ord-1")).unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let pool = vec![
            profile("farm-1", 3000),
            profile("farm-2", 2000),
            profile("farm-3", 1000),
        ];
        let events = action(pool)
            .execute(&mut ctx, &officer_metadata())
            .await
            .unwrap();

        // 5000 needed: farm-1 covers 3000, farm-2 the remaining 2000,
        // farm-3 gets nothing
        assert_eq!(events.len(), 2);
        let quantities: Vec<u32> = events
            .iter()
            .map(|e| match &e.payload {
                EventPayload::FarmAssigned { quantity, .. } => *quantity,
                other => panic!("Expected FarmAssigned, got {:?}", other),
            })
            .collect();
        assert_eq!(quantities, vec![3000, 2000]);

        let numbers: Vec<String> = events
            .iter()
            .map(|e| match &e.payload {
                EventPayload::FarmAssigned {
                    assignment_number, ..
                } => assignment_number.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            numbers,
            vec!["PO-20260101-1001-A1", "PO-20260101-1001-A2"]
        );

        let outcome = ctx.take_recommendation().unwrap();
        assert!(outcome.fully_satisfied);
        assert_eq!(outcome.quantity_allocated, 5000);
    }

    #[tokio::test]
    async fn empty_pool_is_a_validation_error() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store.put_order(&txn, &published_order("ord-1")).unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let result = action(vec![]).execute(&mut ctx, &officer_metadata()).await;
        assert!(matches!(result, Err(FulfillmentError::Validation(_))));
    }

    #[tokio::test]
    async fn fully_allocated_order_is_rejected() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let mut order = published_order("ord-1");
        order.status = shared::fulfillment::OrderStatus::Assigning;
        order.quantity_assigned = order.quantity_needed;
        store.put_order(&txn, &order).unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let result = action(vec![profile("farm-1", 9000)])
            .execute(&mut ctx, &officer_metadata())
            .await;
        assert!(matches!(result, Err(FulfillmentError::Validation(_))));
    }

    #[tokio::test]
    async fn draft_order_is_rejected() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        store
            .put_order(&txn, &crate::fulfillment::actions::testutil::draft_order("ord-1"))
            .unwrap();
        let mut ctx = CommandContext::new(&txn, &store, 0);

        let result = action(vec![profile("farm-1", 9000)])
            .execute(&mut ctx, &officer_metadata())
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InvalidStateTransition { .. })
        ));
    }
}
