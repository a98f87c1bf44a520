//! InvoiceApproved applier

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{EventPayload, FulfillmentEvent, InvoiceStatus};

pub struct InvoiceApprovedApplier;

impl EventApplier for InvoiceApprovedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::InvoiceApproved { invoice_id, .. } = &event.payload else {
            return Ok(());
        };

        let mut invoice = ctx.invoice(invoice_id)?;
        invoice.status = InvoiceStatus::Approved;
        invoice.approved_by = Some(event.actor_id.clone());
        invoice.approved_at = Some(event.timestamp);
        invoice.updated_at = event.timestamp;
        ctx.save_invoice(invoice);
        Ok(())
    }
}
