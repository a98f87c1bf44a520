//! ProcessPayment command handler
//!
//! Settles an approved invoice through the payment rail. The rail call
//! happens after every business-rule check has passed and its result is
//! recorded by the same transaction that marks the invoice paid, so
//! money moves exactly once per verified invoice. Duplicate submissions
//! are short-circuited earlier by the idempotency layer and never reach
//! the rail.
//!
//! Paying the last invoice of a fully delivered order also completes the
//! order.

use std::sync::Arc;

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::fulfillment::transitions::{ensure_invoice_transition, ensure_order_transition};
use crate::services::{PaymentRail, TransferRequest};
use shared::fulfillment::{
    AssignmentStatus, EventPayload, FulfillmentEvent, FulfillmentEventType, InvoiceStatus,
    OrderStatus,
};

/// ProcessPayment action
pub struct ProcessPaymentAction {
    pub invoice_id: String,
    /// Injected settlement rail
    pub rail: Arc<dyn PaymentRail>,
}

#[async_trait]
impl CommandHandler for ProcessPaymentAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let invoice = ctx.invoice(&self.invoice_id)?;

        // The payment path is approved → processing → paid
        ensure_invoice_transition(invoice.status, InvoiceStatus::Processing)?;
        ensure_invoice_transition(InvoiceStatus::Processing, InvoiceStatus::Paid)?;

        // Goods must be on the road or already verified; the assignment
        // itself only reaches `paid` when its last invoice settles
        let assignment = ctx.assignment(&invoice.assignment_id)?;
        if !matches!(
            assignment.status,
            AssignmentStatus::InTransit | AssignmentStatus::Delivered | AssignmentStatus::Verified
        ) {
            return Err(FulfillmentError::InvalidStateTransition {
                entity: "assignment",
                from: assignment.status.to_string(),
                attempted: AssignmentStatus::Paid.to_string(),
            });
        }

        let destination = assignment.settlement_account.clone().ok_or_else(|| {
            FulfillmentError::Validation(format!(
                "farm {} has no settlement account on file",
                assignment.farm_name
            ))
        })?;

        // Every rule has passed. Execute the transfer and record its
        // result in this same transaction
        let receipt = self
            .rail
            .execute_transfer(TransferRequest {
                amount: invoice.total,
                destination_account: destination,
                reference: invoice.invoice_number.clone(),
            })
            .await
            .map_err(FulfillmentError::PaymentRail)?;
        if !receipt.success {
            return Err(FulfillmentError::PaymentRail(format!(
                "transfer for invoice {} was not accepted",
                invoice.invoice_number
            )));
        }

        let mut events = Vec::new();
        let seq = ctx.next_sequence();
        events.push(FulfillmentEvent::new(
            seq,
            invoice.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::InvoicePaid,
            EventPayload::InvoicePaid {
                invoice_id: self.invoice_id.clone(),
                assignment_id: invoice.assignment_id.clone(),
                amount: invoice.total,
                payment_reference: receipt.reference_id,
            },
        ));

        // Completion check: a fully delivered order completes when its
        // last outstanding invoice is paid
        let order = ctx.order(&invoice.order_id)?;
        if order.status == OrderStatus::FullyDelivered {
            let all_settled = ctx
                .invoices_for_order(&invoice.order_id)?
                .iter()
                .filter(|i| i.invoice_id != self.invoice_id)
                .all(|i| matches!(i.status, InvoiceStatus::Paid | InvoiceStatus::Rejected));
            if all_settled {
                ensure_order_transition(order.status, OrderStatus::Completed)?;
                let seq = ctx.next_sequence();
                events.push(FulfillmentEvent::new(
                    seq,
                    invoice.order_id.clone(),
                    metadata.actor.id.clone(),
                    metadata.actor.name.clone(),
                    metadata.command_id.clone(),
                    FulfillmentEventType::OrderCompleted,
                    EventPayload::OrderCompleted {},
                ));
            }
        }

        Ok(events)
    }
}
