//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles one
//! specific operation: validate against current state, then emit events.
//! Actions never write; persistence is the manager's job.

use async_trait::async_trait;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use shared::fulfillment::FulfillmentEvent;

mod accept_assignment;
mod advance_assignment;
mod assign_farm;
mod auto_assign;
mod cancel_assignment;
mod cancel_order;
mod confirm_delivery;
mod create_order;
mod process_payment;
mod publish_order;
mod reject_assignment;
mod review_invoice;
mod verify_delivery;

#[cfg(test)]
pub mod testutil;

pub use accept_assignment::AcceptAssignmentAction;
pub use advance_assignment::AdvanceAssignmentAction;
pub use assign_farm::AssignFarmAction;
pub use auto_assign::AutoAssignAction;
pub use cancel_assignment::CancelAssignmentAction;
pub use cancel_order::CancelOrderAction;
pub use confirm_delivery::ConfirmDeliveryAction;
pub use create_order::CreateOrderAction;
pub use process_payment::ProcessPaymentAction;
pub use publish_order::PublishOrderAction;
pub use reject_assignment::RejectAssignmentAction;
pub use review_invoice::{ApproveInvoiceAction, DisputeInvoiceAction, RejectInvoiceAction};
pub use verify_delivery::VerifyDeliveryAction;

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    CreateOrder(CreateOrderAction),
    PublishOrder(PublishOrderAction),
    CancelOrder(CancelOrderAction),
    AutoAssign(AutoAssignAction),
    AssignFarm(AssignFarmAction),
    AcceptAssignment(AcceptAssignmentAction),
    RejectAssignment(RejectAssignmentAction),
    AdvanceAssignment(AdvanceAssignmentAction),
    CancelAssignment(CancelAssignmentAction),
    ConfirmDelivery(ConfirmDeliveryAction),
    VerifyDelivery(VerifyDeliveryAction),
    ApproveInvoice(ApproveInvoiceAction),
    RejectInvoice(RejectInvoiceAction),
    DisputeInvoice(DisputeInvoiceAction),
    ProcessPayment(ProcessPaymentAction),
}

#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError> {
        match self {
            CommandAction::CreateOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::PublishOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::AutoAssign(action) => action.execute(ctx, metadata).await,
            CommandAction::AssignFarm(action) => action.execute(ctx, metadata).await,
            CommandAction::AcceptAssignment(action) => action.execute(ctx, metadata).await,
            CommandAction::RejectAssignment(action) => action.execute(ctx, metadata).await,
            CommandAction::AdvanceAssignment(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelAssignment(action) => action.execute(ctx, metadata).await,
            CommandAction::ConfirmDelivery(action) => action.execute(ctx, metadata).await,
            CommandAction::VerifyDelivery(action) => action.execute(ctx, metadata).await,
            CommandAction::ApproveInvoice(action) => action.execute(ctx, metadata).await,
            CommandAction::RejectInvoice(action) => action.execute(ctx, metadata).await,
            CommandAction::DisputeInvoice(action) => action.execute(ctx, metadata).await,
            CommandAction::ProcessPayment(action) => action.execute(ctx, metadata).await,
        }
    }
}
