//! Invoice review handlers (approve / reject / dispute)
//!
//! Approval optionally enforces separation of duties: the approving
//! actor must differ from the actor whose verification created the
//! invoice.

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::fulfillment::transitions::ensure_invoice_transition;
use shared::fulfillment::{
    EventPayload, FulfillmentEvent, FulfillmentEventType, InvoiceStatus,
};

/// ApproveInvoice action
#[derive(Debug, Clone)]
pub struct ApproveInvoiceAction {
    pub invoice_id: String,
    /// Injected from engine configuration
    pub enforce_separation_of_duties: bool,
}

#[async_trait]
impl CommandHandler for ApproveInvoiceAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let invoice = ctx.invoice(&self.invoice_id)?;

        ensure_invoice_transition(invoice.status, InvoiceStatus::Approved)?;

        if self.enforce_separation_of_duties && invoice.created_by == metadata.actor.id {
            return Err(FulfillmentError::PermissionDenied(format!(
                "invoice {} must be approved by a different officer than its creator",
                invoice.invoice_number
            )));
        }

        let seq = ctx.next_sequence();
        let event = FulfillmentEvent::new(
            seq,
            invoice.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::InvoiceApproved,
            EventPayload::InvoiceApproved {
                invoice_id: self.invoice_id.clone(),
                assignment_id: invoice.assignment_id.clone(),
            },
        );

        Ok(vec![event])
    }
}

/// RejectInvoice action
#[derive(Debug, Clone)]
pub struct RejectInvoiceAction {
    pub invoice_id: String,
    pub reason: String,
}

#[async_trait]
impl CommandHandler for RejectInvoiceAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let invoice = ctx.invoice(&self.invoice_id)?;

        ensure_invoice_transition(invoice.status, InvoiceStatus::Rejected)?;

        if self.reason.trim().is_empty() {
            return Err(FulfillmentError::Validation(
                "a rejection reason is required".to_string(),
            ));
        }

        let seq = ctx.next_sequence();
        let event = FulfillmentEvent::new(
            seq,
            invoice.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::InvoiceRejected,
            EventPayload::InvoiceRejected {
                invoice_id: self.invoice_id.clone(),
                assignment_id: invoice.assignment_id.clone(),
                reason: self.reason.clone(),
            },
        );

        Ok(vec![event])
    }
}

/// DisputeInvoice action
#[derive(Debug, Clone)]
pub struct DisputeInvoiceAction {
    pub invoice_id: String,
    pub reason: String,
}

#[async_trait]
impl CommandHandler for DisputeInvoiceAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        let invoice = ctx.invoice(&self.invoice_id)?;

        ensure_invoice_transition(invoice.status, InvoiceStatus::Disputed)?;

        if self.reason.trim().is_empty() {
            return Err(FulfillmentError::Validation(
                "a dispute reason is required".to_string(),
            ));
        }

        let seq = ctx.next_sequence();
        let event = FulfillmentEvent::new(
            seq,
            invoice.order_id.clone(),
            metadata.actor.id.clone(),
            metadata.actor.name.clone(),
            metadata.command_id.clone(),
            FulfillmentEventType::InvoiceDisputed,
            EventPayload::InvoiceDisputed {
                invoice_id: self.invoice_id.clone(),
                assignment_id: invoice.assignment_id.clone(),
                reason: self.reason.clone(),
            },
        );

        Ok(vec![event])
    }
}
