//! VerifyDelivery command handler
//!
//! An officer inspects a confirmed delivery and records the quality
//! outcome. Verification is immutable, and it automatically raises the
//! invoice settling that delivery: subtotal = quantity × unit price,
//! minus configured deductions for mortality and failed inspection.
//!
//! One non-terminal invoice per assignment: while an earlier invoice is
//! still open, further verifications are refused so corrections go
//! through explicit invoice review, never silent replacement.

use async_trait::async_trait;

use crate::fulfillment::money::{compute_invoice_totals, DeductionRates};
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use shared::fulfillment::{
    AssignmentStatus, EventPayload, FulfillmentEvent, FulfillmentEventType, VerificationInput,
};

/// VerifyDelivery action
#[derive(Debug, Clone)]
pub struct VerifyDeliveryAction {
    pub delivery_id: String,
    pub verification: VerificationInput,
    /// Injected from engine configuration
    pub rates: DeductionRates,
}

#[async_trait]
impl CommandHandler for VerifyDeliveryAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let delivery = ctx.delivery(&self.delivery_id)?;

        if delivery.is_verified() {
            return Err(FulfillmentError::Validation(format!(
                "delivery {} is already verified and immutable",
                self.delivery_id
            )));
        }

        let assignment = ctx.assignment(&delivery.assignment_id)?;
        // Verification happens between delivery confirmation and payment;
        // partial batches may be verified while the rest is still rolling.
        if !matches!(
            assignment.status,
            AssignmentStatus::InTransit | AssignmentStatus::Delivered
        ) {
            return Err(FulfillmentError::InvalidStateTransition {
                entity: "assignment",
                from: assignment.status.to_string(),
                attempted: AssignmentStatus::Verified.to_string(),
            });
        }

        let open_invoice = ctx
            .invoices_for_assignment(&assignment.assignment_id)?
            .into_iter()
            .find(|invoice| !invoice.status.is_terminal());
        if let Some(invoice) = open_invoice {
            return Err(FulfillmentError::Validation(format!(
                "assignment {} has open invoice {}; settle it before verifying further deliveries",
                assignment.assignment_number, invoice.invoice_number
            )));
        }

        let totals = compute_invoice_totals(
            delivery.quantity,
            assignment.unit_price,
            self.verification.quality_passed,
            delivery.loss_count,
            &self.rates,
        );

        let invoice_count = ctx
            .invoices_for_assignment(&assignment.assignment_id)?
            .len();
        let invoice_number = format!("{}-I{}", assignment.assignment_number, invoice_count + 1);
        let invoice_id = uuid::Uuid::new_v4().to_string();

        let seq = ctx.next_sequence();
        let verified = FulfillmentEvent::new(
            seq,
            assignment.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::DeliveryVerified,
            EventPayload::DeliveryVerified {
                assignment_id: assignment.assignment_id.clone(),
                delivery_id: self.delivery_id.clone(),
                quality_passed: self.verification.quality_passed,
                note: self.verification.note.clone(),
            },
        );

        let seq = ctx.next_sequence();
        let invoiced = FulfillmentEvent::new(
            seq,
            assignment.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::InvoiceCreated,
            EventPayload::InvoiceCreated {
                invoice_id,
                invoice_number,
                assignment_id: assignment.assignment_id.clone(),
                delivery_id: self.delivery_id.clone(),
                quantity: delivery.quantity,
                unit_price: assignment.unit_price,
                subtotal: totals.subtotal,
                quality_deduction: totals.quality_deduction,
                loss_deduction: totals.loss_deduction,
                other_deduction: totals.other_deduction,
                total: totals.total,
            },
        );

        Ok(vec![verified, invoiced])
    }
}
