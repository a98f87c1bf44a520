//! AssignFarm command handler
//!
//! Commits one farm to a share of an order. The farm profile is resolved
//! by the manager from the directory and injected here.

use async_trait::async_trait;

use crate::fulfillment::money::validate_amount;
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::fulfillment::transitions::ensure_order_transition;
use crate::recommendation::scoring::is_eligible;
use shared::farm::FarmProfile;
use shared::fulfillment::{
    EventPayload, FulfillmentEvent, FulfillmentEventType, OrderStatus,
};

/// AssignFarm action
#[derive(Debug, Clone)]
pub struct AssignFarmAction {
    pub order_id: String,
    pub farm_id: String,
    pub quantity: u32,
    pub unit_price: Option<f64>,
    /// Directory profile; None when the directory does not know the farm
    pub farm: Option<FarmProfile>,
}

impl AssignFarmAction {
    /// Validate and build the FarmAssigned event. Shared with
    /// auto-assignment, which emits one of these per allocated farm.
    ///
    /// `assignment_seq` is the 1-based position in the order's assignment
    /// numbering; callers emitting several events in one command pass
    /// increasing values because snapshots only update after the action.
    pub(crate) fn build_event(
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
        order_id: &str,
        farm: &FarmProfile,
        quantity: u32,
        unit_price: f64,
        auto_assigned: bool,
        assignment_seq: usize,
    ) -> Result<FulfillmentEvent, FulfillmentError> {
        let order = ctx.order(order_id)?;

        // Assignment is only legal while the order is collecting farms
        if order.status != OrderStatus::Assigning {
            ensure_order_transition(order.status, OrderStatus::Assigning)?;
        }

        if !is_eligible(farm, order.product_type) {
            return Err(FulfillmentError::FarmNotEligible {
                farm_id: farm.farm_id.clone(),
                reason: format!(
                    "not approved for {} supply",
                    order.product_type
                ),
            });
        }

        if quantity == 0 {
            return Err(FulfillmentError::Validation(
                "assignment quantity must be positive".to_string(),
            ));
        }
        let remaining = order.quantity_remaining();
        if quantity > remaining {
            return Err(FulfillmentError::Validation(format!(
                "quantity {} exceeds unallocated remainder {} of order {}",
                quantity, remaining, order.order_number
            )));
        }

        if ctx
            .active_assignment_for_farm(order_id, &farm.farm_id)?
            .is_some()
        {
            return Err(FulfillmentError::DuplicateAssignment {
                order_id: order_id.to_string(),
                farm_id: farm.farm_id.clone(),
            });
        }

        validate_amount(unit_price, "unit_price").map_err(FulfillmentError::Validation)?;
        if unit_price <= 0.0 {
            return Err(FulfillmentError::Validation(
                "unit_price must be positive".to_string(),
            ));
        }

        let assignment_number = format!("{}-A{}", order.order_number, assignment_seq);
        let assignment_id = uuid::Uuid::new_v4().to_string();

        let seq = ctx.next_sequence();
        Ok(FulfillmentEvent::new(
            seq,
            order_id.to_string(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::FarmAssigned,
            EventPayload::FarmAssigned {
                assignment_id,
                assignment_number,
                farm_id: farm.farm_id.clone(),
                farm_name: farm.farm_name.clone(),
                settlement_account: farm.settlement_account.clone(),
                quantity,
                unit_price,
                auto_assigned,
            },
        ))
    }
}

#[async_trait]
impl CommandHandler for AssignFarmAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let farm = self.farm.as_ref().ok_or_else(|| FulfillmentError::FarmNotEligible {
            farm_id: self.farm_id.clone(),
            reason: "unknown to the farm directory".to_string(),
        })?;

        let order = ctx.order(&self.order_id)?;
        let unit_price = self.unit_price.unwrap_or(order.unit_price);
        let assignment_seq = ctx.assignment_count_for_order(&self.order_id)? + 1;

        let event = Self::build_event(
            ctx,
            metadata,
            &self.order_id,
            farm,
            self.quantity,
            unit_price,
            false,
            assignment_seq,
        )?;
        Ok(vec![event])
    }
}
