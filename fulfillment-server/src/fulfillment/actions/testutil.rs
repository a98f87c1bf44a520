//! Shared fixtures for action tests

use shared::fulfillment::{
    AssignmentSnapshot, AssignmentStatus, DeliveryConfirmation, InvoiceSnapshot, InvoiceStatus,
    OrderSnapshot, OrderStatus, ProductType,
};
use shared::util::now_millis;
use shared::Actor;

use crate::fulfillment::traits::CommandMetadata;

pub fn officer_metadata() -> CommandMetadata {
    CommandMetadata {
        command_id: "cmd-1".to_string(),
        actor: Actor::officer("officer-1", "A. Mensah"),
        timestamp: now_millis(),
    }
}

pub fn farm_metadata(farm_id: &str) -> CommandMetadata {
    CommandMetadata {
        command_id: "cmd-2".to_string(),
        actor: Actor::farm_operator("user-9", "K. Osei", farm_id),
        timestamp: now_millis(),
    }
}

pub fn draft_order(order_id: &str) -> OrderSnapshot {
    let now = now_millis();
    OrderSnapshot {
        order_id: order_id.to_string(),
        order_number: "PO-20260101-1001".to_string(),
        product_type: ProductType::Broiler,
        quantity_needed: 5000,
        unit_price: 85.0,
        total_budget: 500_000.0,
        delivery_deadline: now + 7 * 86_400_000,
        preferred_region: Some("Ashanti".to_string()),
        status: OrderStatus::Draft,
        quantity_assigned: 0,
        quantity_delivered: 0,
        created_by: "officer-1".to_string(),
        cancel_reason: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn published_order(order_id: &str) -> OrderSnapshot {
    let mut order = draft_order(order_id);
    order.status = OrderStatus::Published;
    order
}

pub fn assignment(
    assignment_id: &str,
    order_id: &str,
    farm_id: &str,
    status: AssignmentStatus,
) -> AssignmentSnapshot {
    let now = now_millis();
    AssignmentSnapshot {
        assignment_id: assignment_id.to_string(),
        assignment_number: "PO-20260101-1001-A1".to_string(),
        order_id: order_id.to_string(),
        farm_id: farm_id.to_string(),
        farm_name: "Sunrise Farm".to_string(),
        settlement_account: Some("MM-0244-000-111".to_string()),
        quantity_assigned: 1800,
        quantity_delivered: 0,
        unit_price: 85.0,
        status,
        readiness_date: None,
        reject_reason: None,
        cancel_reason: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn delivery(delivery_id: &str, assignment_id: &str, order_id: &str) -> DeliveryConfirmation {
    DeliveryConfirmation {
        delivery_id: delivery_id.to_string(),
        assignment_id: assignment_id.to_string(),
        order_id: order_id.to_string(),
        quantity: 1800,
        average_unit_weight_kg: Some(1.9),
        loss_count: 5,
        note: None,
        quality_passed: None,
        verified_by: None,
        verified_by_name: None,
        verified_at: None,
        delivered_at: now_millis(),
    }
}

pub fn invoice(
    invoice_id: &str,
    assignment_id: &str,
    order_id: &str,
    status: InvoiceStatus,
) -> InvoiceSnapshot {
    let now = now_millis();
    InvoiceSnapshot {
        invoice_id: invoice_id.to_string(),
        invoice_number: "PO-20260101-1001-A1-I1".to_string(),
        assignment_id: assignment_id.to_string(),
        order_id: order_id.to_string(),
        delivery_id: "del-1".to_string(),
        quantity: 1800,
        unit_price: 85.0,
        subtotal: 153_000.0,
        quality_deduction: 0.0,
        loss_deduction: 125.0,
        other_deduction: 0.0,
        total: 152_875.0,
        status,
        created_by: "officer-1".to_string(),
        approved_by: None,
        approved_at: None,
        payment_reference: None,
        paid_at: None,
        review_note: None,
        created_at: now,
        updated_at: now,
    }
}
