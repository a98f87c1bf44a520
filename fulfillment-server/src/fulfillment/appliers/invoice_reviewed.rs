//! Invoice review appliers (rejected / disputed)

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{EventPayload, FulfillmentEvent, InvoiceStatus};

pub struct InvoiceRejectedApplier;

impl EventApplier for InvoiceRejectedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::InvoiceRejected {
            invoice_id, reason, ..
        } = &event.payload
        else {
            return Ok(());
        };

        let mut invoice = ctx.invoice(invoice_id)?;
        invoice.status = InvoiceStatus::Rejected;
        invoice.review_note = Some(reason.clone());
        invoice.updated_at = event.timestamp;
        ctx.save_invoice(invoice);
        Ok(())
    }
}

pub struct InvoiceDisputedApplier;

impl EventApplier for InvoiceDisputedApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::InvoiceDisputed {
            invoice_id, reason, ..
        } = &event.payload
        else {
            return Ok(());
        };

        let mut invoice = ctx.invoice(invoice_id)?;
        invoice.status = InvoiceStatus::Disputed;
        invoice.review_note = Some(reason.clone());
        invoice.updated_at = event.timestamp;
        ctx.save_invoice(invoice);
        Ok(())
    }
}
