//! InvoiceCreated applier - materializes the pending invoice

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{EventPayload, FulfillmentEvent, InvoiceSnapshot, InvoiceStatus};

pub struct InvoiceCreatedApplier;

impl EventApplier for InvoiceCreatedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::InvoiceCreated {
            invoice_id,
            invoice_number,
            assignment_id,
            delivery_id,
            quantity,
            unit_price,
            subtotal,
            quality_deduction,
            loss_deduction,
            other_deduction,
            total,
        } = &event.payload
        else {
            return Ok(());
        };

        ctx.save_invoice(InvoiceSnapshot {
            invoice_id: invoice_id.clone(),
            invoice_number: invoice_number.clone(),
            assignment_id: assignment_id.clone(),
            order_id: event.order_id.clone(),
            delivery_id: delivery_id.clone(),
            quantity: *quantity,
            unit_price: *unit_price,
            subtotal: *subtotal,
            quality_deduction: *quality_deduction,
            loss_deduction: *loss_deduction,
            other_deduction: *other_deduction,
            total: *total,
            status: InvoiceStatus::Pending,
            created_by: event.actor_id.clone(),
            approved_by: None,
            approved_at: None,
            payment_reference: None,
            paid_at: None,
            review_note: None,
            created_at: event.timestamp,
            updated_at: event.timestamp,
        });
        Ok(())
    }
}
