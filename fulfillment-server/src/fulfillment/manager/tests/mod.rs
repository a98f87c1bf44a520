//! FulfillmentManager test suite
//!
//! Exercises whole operations through `execute`, the same entry point
//! the HTTP layer uses, against an in-memory ledger.

mod test_payment;

use std::sync::Arc;

use shared::farm::{ApprovalStatus, FarmProfile};
use shared::fulfillment::{
    CommandPayload, CommandResponse, DeliveryInput, FulfillmentCommand, ProductType,
    VerificationInput,
};
use shared::util::now_millis;
use shared::Actor;

use crate::fulfillment::manager::{EngineConfig, FulfillmentManager};
use crate::fulfillment::storage::LedgerStore;
use crate::services::{
    LoggingNotifier, RecordingPaymentRail, RoleBasedPolicy, StaticFarmDirectory,
};

/// Manager wired with an in-memory ledger and recording collaborators
pub(super) struct Harness {
    pub manager: Arc<FulfillmentManager>,
    pub rail: Arc<RecordingPaymentRail>,
    pub directory: Arc<StaticFarmDirectory>,
}

pub(super) fn harness_with(farms: Vec<FarmProfile>, config: EngineConfig) -> Harness {
    let store = LedgerStore::open_in_memory().unwrap();
    let rail = Arc::new(RecordingPaymentRail::new());
    let directory = Arc::new(StaticFarmDirectory::new(farms));
    let manager = Arc::new(FulfillmentManager::new(
        store,
        config,
        directory.clone(),
        Arc::new(RoleBasedPolicy),
        rail.clone(),
        Arc::new(LoggingNotifier),
    ));
    Harness {
        manager,
        rail,
        directory,
    }
}

pub(super) fn harness(farms: Vec<FarmProfile>) -> Harness {
    harness_with(farms, EngineConfig::default())
}

pub(super) fn broiler_farm(id: &str, inventory: u32) -> FarmProfile {
    FarmProfile {
        farm_id: id.to_string(),
        farm_name: format!("Farm {}", id),
        region: "Ashanti".to_string(),
        approval_status: ApprovalStatus::Approved,
        production_types: vec![ProductType::Broiler],
        business_registered: true,
        settlement_account: Some(format!("MM-{}", id)),
        current_inventory: inventory,
    }
}

pub(super) fn officer() -> Actor {
    Actor::officer("officer-1", "A. Mensah")
}

pub(super) fn second_officer() -> Actor {
    Actor::officer("officer-2", "E. Boateng")
}

pub(super) fn farm_operator(farm_id: &str) -> Actor {
    Actor::farm_operator(format!("user-{}", farm_id), "K. Osei", farm_id)
}

/// Execute a payload as the given actor and require success
pub(super) async fn exec_ok(
    harness: &Harness,
    actor: Actor,
    payload: CommandPayload,
) -> CommandResponse {
    let response = harness
        .manager
        .execute(FulfillmentCommand::new(actor, payload))
        .await;
    assert!(
        response.success,
        "command failed: {:?}",
        response.error
    );
    response
}

/// Execute a payload and require failure
pub(super) async fn exec_err(
    harness: &Harness,
    actor: Actor,
    payload: CommandPayload,
) -> CommandResponse {
    let response = harness
        .manager
        .execute(FulfillmentCommand::new(actor, payload))
        .await;
    assert!(!response.success, "command unexpectedly succeeded");
    response
}

/// Create and publish an order; returns its id
pub(super) async fn published_order(harness: &Harness, quantity: u32) -> String {
    let response = exec_ok(
        harness,
        officer(),
        CommandPayload::CreateOrder {
            product_type: ProductType::Broiler,
            quantity_needed: quantity,
            unit_price: 85.0,
            total_budget: quantity as f64 * 85.0,
            delivery_deadline: now_millis() + 7 * 86_400_000,
            preferred_region: Some("Ashanti".to_string()),
        },
    )
    .await;
    let order_id = response.order.unwrap().order_id;
    exec_ok(
        harness,
        officer(),
        CommandPayload::PublishOrder {
            order_id: order_id.clone(),
        },
    )
    .await;
    order_id
}

/// Drive an assignment from pending to in_transit as the farm operator
pub(super) async fn drive_to_transit(harness: &Harness, assignment_id: &str, farm_id: &str) {
    exec_ok(
        harness,
        farm_operator(farm_id),
        CommandPayload::AcceptAssignment {
            assignment_id: assignment_id.to_string(),
        },
    )
    .await;
    exec_ok(
        harness,
        farm_operator(farm_id),
        CommandPayload::StartPreparing {
            assignment_id: assignment_id.to_string(),
            readiness_date: now_millis() + 2 * 86_400_000,
        },
    )
    .await;
    exec_ok(
        harness,
        farm_operator(farm_id),
        CommandPayload::MarkReady {
            assignment_id: assignment_id.to_string(),
        },
    )
    .await;
    exec_ok(
        harness,
        farm_operator(farm_id),
        CommandPayload::StartTransit {
            assignment_id: assignment_id.to_string(),
        },
    )
    .await;
}

/// Confirm a delivery and return the delivery id
pub(super) async fn confirm_delivery(
    harness: &Harness,
    assignment_id: &str,
    farm_id: &str,
    quantity: u32,
    loss_count: u32,
) -> String {
    let response = exec_ok(
        harness,
        farm_operator(farm_id),
        CommandPayload::ConfirmDelivery {
            assignment_id: assignment_id.to_string(),
            delivery: DeliveryInput {
                quantity,
                average_unit_weight_kg: Some(1.9),
                loss_count,
                note: None,
            },
        },
    )
    .await;
    response.delivery.unwrap().delivery_id
}

/// Verify a delivery and return the created invoice id
pub(super) async fn verify_delivery(
    harness: &Harness,
    delivery_id: &str,
    quality_passed: bool,
) -> String {
    let response = exec_ok(
        harness,
        officer(),
        CommandPayload::VerifyDelivery {
            delivery_id: delivery_id.to_string(),
            verification: VerificationInput {
                quality_passed,
                note: None,
            },
        },
    )
    .await;
    response.invoice.unwrap().invoice_id
}

/// One fully assigned, accepted, in-transit assignment for the order
pub(super) async fn assigned_in_transit(
    harness: &Harness,
    order_id: &str,
    farm_id: &str,
) -> String {
    let response = exec_ok(
        harness,
        officer(),
        CommandPayload::AutoAssign {
            order_id: order_id.to_string(),
            max_farms: None,
        },
    )
    .await;
    let assignment_id = harness
        .manager
        .assignments_for_order(order_id)
        .unwrap()
        .into_iter()
        .find(|a| a.farm_id == farm_id)
        .unwrap()
        .assignment_id;
    assert!(response.recommendation.unwrap().fully_satisfied);
    drive_to_transit(harness, &assignment_id, farm_id).await;
    assignment_id
}
