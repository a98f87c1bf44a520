//! Financial safety: payment idempotency, separation of duties,
//! rail failures, deduction math

use super::*;
use shared::fulfillment::{
    AssignmentStatus, CommandErrorCode, InvoiceStatus, OrderStatus,
};

/// Drive a 1800-unit order to an approved invoice; returns (order, invoice)
async fn approved_invoice(h: &Harness) -> (String, String) {
    let order_id = published_order(h, 1800).await;
    let assignment_id = assigned_in_transit(h, &order_id, "farm-1").await;
    let delivery_id = confirm_delivery(h, &assignment_id, "farm-1", 1800, 5).await;
    let invoice_id = verify_delivery(h, &delivery_id, true).await;
    exec_ok(
        h,
        second_officer(),
        CommandPayload::ApproveInvoice {
            invoice_id: invoice_id.clone(),
        },
    )
    .await;
    (order_id, invoice_id)
}

#[tokio::test]
async fn paying_twice_with_same_key_moves_money_once() {
    let h = harness(vec![broiler_farm("farm-1", 2000)]);
    let (_, invoice_id) = approved_invoice(&h).await;

    let pay = FulfillmentCommand::with_command_id(
        "pay-once",
        second_officer(),
        CommandPayload::ProcessPayment {
            invoice_id: invoice_id.clone(),
        },
    );

    let first = h.manager.execute(pay.clone()).await;
    assert!(first.success);
    assert!(!first.is_duplicate);

    let second = h.manager.execute(pay).await;
    assert!(second.success);
    assert!(second.is_duplicate);

    // Identical payloads, one side effect
    assert_eq!(
        first.invoice.as_ref().unwrap().payment_reference,
        second.invoice.as_ref().unwrap().payment_reference
    );
    assert_eq!(h.rail.executed().len(), 1);
}

#[tokio::test]
async fn resubmission_with_fresh_key_is_still_rejected() {
    let h = harness(vec![broiler_farm("farm-1", 2000)]);
    let (_, invoice_id) = approved_invoice(&h).await;

    exec_ok(
        &h,
        second_officer(),
        CommandPayload::ProcessPayment {
            invoice_id: invoice_id.clone(),
        },
    )
    .await;

    // A new command id means the idempotency layer does not apply, but
    // the invoice state machine does: paid invoices cannot be paid again
    let response = exec_err(
        &h,
        second_officer(),
        CommandPayload::ProcessPayment {
            invoice_id: invoice_id.clone(),
        },
    )
    .await;
    assert_eq!(
        response.error.unwrap().code,
        CommandErrorCode::InvalidStateTransition
    );
    assert_eq!(h.rail.executed().len(), 1);
}

#[tokio::test]
async fn verifier_cannot_approve_own_invoice() {
    let h = harness(vec![broiler_farm("farm-1", 2000)]);
    let order_id = published_order(&h, 1800).await;
    let assignment_id = assigned_in_transit(&h, &order_id, "farm-1").await;
    let delivery_id = confirm_delivery(&h, &assignment_id, "farm-1", 1800, 0).await;
    // Verified by officer-1 (the default officer in the helpers)
    let invoice_id = verify_delivery(&h, &delivery_id, true).await;

    let response = exec_err(
        &h,
        officer(),
        CommandPayload::ApproveInvoice {
            invoice_id: invoice_id.clone(),
        },
    )
    .await;
    assert_eq!(
        response.error.unwrap().code,
        CommandErrorCode::PermissionDenied
    );

    // A different officer may approve
    exec_ok(
        &h,
        second_officer(),
        CommandPayload::ApproveInvoice { invoice_id },
    )
    .await;
}

#[tokio::test]
async fn rail_failure_keeps_invoice_approved_and_is_retryable() {
    let h = harness(vec![broiler_farm("farm-1", 2000)]);
    let (_, invoice_id) = approved_invoice(&h).await;

    h.rail.fail_next();
    let response = exec_err(
        &h,
        second_officer(),
        CommandPayload::ProcessPayment {
            invoice_id: invoice_id.clone(),
        },
    )
    .await;
    assert_eq!(
        response.error.unwrap().code,
        CommandErrorCode::PaymentRailFailed
    );

    // Nothing was committed; a retry with a fresh key succeeds
    let invoice = h.manager.get_invoice(&invoice_id).unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Approved);
    assert!(invoice.payment_reference.is_none());

    exec_ok(
        &h,
        second_officer(),
        CommandPayload::ProcessPayment { invoice_id },
    )
    .await;
    assert_eq!(h.rail.executed().len(), 1);
}

#[tokio::test]
async fn failed_inspection_deducts_quality_percentage() {
    let h = harness(vec![broiler_farm("farm-1", 2000)]);
    let order_id = published_order(&h, 1800).await;
    let assignment_id = assigned_in_transit(&h, &order_id, "farm-1").await;
    let delivery_id = confirm_delivery(&h, &assignment_id, "farm-1", 1800, 5).await;

    let invoice_id = verify_delivery(&h, &delivery_id, false).await;
    let invoice = h.manager.get_invoice(&invoice_id).unwrap().unwrap();
    // 153,000 − 10% quality − 125 mortality
    assert_eq!(invoice.subtotal, 153_000.0);
    assert_eq!(invoice.quality_deduction, 15_300.0);
    assert_eq!(invoice.loss_deduction, 125.0);
    assert_eq!(invoice.total, 137_575.0);

    // Failing inspection still verified the delivery
    let delivery = h.manager.get_delivery(&delivery_id).unwrap().unwrap();
    assert_eq!(delivery.quality_passed, Some(false));
    let assignment = h.manager.get_assignment(&assignment_id).unwrap().unwrap();
    assert_eq!(assignment.status, AssignmentStatus::Verified);
}

#[tokio::test]
async fn rejected_invoice_halts_payment_and_dispute_can_recover() {
    let h = harness(vec![broiler_farm("farm-1", 2000)]);
    let order_id = published_order(&h, 1800).await;
    let assignment_id = assigned_in_transit(&h, &order_id, "farm-1").await;
    let delivery_id = confirm_delivery(&h, &assignment_id, "farm-1", 1800, 0).await;
    let invoice_id = verify_delivery(&h, &delivery_id, true).await;

    exec_ok(
        &h,
        second_officer(),
        CommandPayload::RejectInvoice {
            invoice_id: invoice_id.clone(),
            reason: "Quantity mismatch with waybill".to_string(),
        },
    )
    .await;
    let invoice = h.manager.get_invoice(&invoice_id).unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Rejected);

    let response = exec_err(
        &h,
        second_officer(),
        CommandPayload::ProcessPayment {
            invoice_id: invoice_id.clone(),
        },
    )
    .await;
    assert_eq!(
        response.error.unwrap().code,
        CommandErrorCode::InvalidStateTransition
    );
    assert!(h.rail.executed().is_empty());
}

#[tokio::test]
async fn farm_can_dispute_and_officer_resolves_to_payment() {
    let h = harness(vec![broiler_farm("farm-1", 2000)]);
    let order_id = published_order(&h, 1800).await;
    let assignment_id = assigned_in_transit(&h, &order_id, "farm-1").await;
    let delivery_id = confirm_delivery(&h, &assignment_id, "farm-1", 1800, 5).await;
    let invoice_id = verify_delivery(&h, &delivery_id, true).await;

    // The supplying farm disputes its own invoice
    exec_ok(
        &h,
        farm_operator("farm-1"),
        CommandPayload::DisputeInvoice {
            invoice_id: invoice_id.clone(),
            reason: "Deduction applied to birds lost after weighing".to_string(),
        },
    )
    .await;
    let invoice = h.manager.get_invoice(&invoice_id).unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Disputed);

    // Resolution in the farm's favour re-approves, then pays
    exec_ok(
        &h,
        second_officer(),
        CommandPayload::ApproveInvoice {
            invoice_id: invoice_id.clone(),
        },
    )
    .await;
    exec_ok(
        &h,
        second_officer(),
        CommandPayload::ProcessPayment {
            invoice_id: invoice_id.clone(),
        },
    )
    .await;
    let order = h.manager.get_order(&order_id).unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
}
