//! InvoicePaid applier
//!
//! Marks the invoice paid (via the transient `processing` step of the
//! payment path) and settles the assignment once every non-rejected
//! invoice of a verified assignment is paid.

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use shared::fulfillment::{
    AssignmentStatus, EventPayload, FulfillmentEvent, InvoiceStatus,
};

pub struct InvoicePaidApplier;

impl EventApplier for InvoicePaidApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError> {
        let EventPayload::InvoicePaid {
            invoice_id,
            assignment_id,
            payment_reference,
            ..
        } = &event.payload
        else {
            return Ok(());
        };

        let mut invoice = ctx.invoice(invoice_id)?;
        invoice.status = InvoiceStatus::Paid;
        invoice.payment_reference = Some(payment_reference.clone());
        invoice.paid_at = Some(event.timestamp);
        invoice.updated_at = event.timestamp;
        ctx.save_invoice(invoice);

        let assignment = ctx.assignment(assignment_id)?;
        if assignment.status == AssignmentStatus::Verified {
            let all_paid = ctx
                .invoices_for_assignment(assignment_id)?
                .iter()
                .filter(|i| i.status != InvoiceStatus::Rejected)
                .all(|i| i.status == InvoiceStatus::Paid);
            if all_paid {
                let mut assignment = ctx.assignment(assignment_id)?;
                assignment.status = AssignmentStatus::Paid;
                assignment.updated_at = event.timestamp;
                ctx.save_assignment(assignment);
            }
        }
        Ok(())
    }
}
