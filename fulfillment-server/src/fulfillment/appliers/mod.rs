//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and mutates the
//! affected snapshots for one event type. Appliers are mechanical: every
//! business rule was checked by the action that emitted the event. They
//! also maintain the derived order quantities and roll-up status
//! (`quantity_assigned`, `quantity_delivered`, partial/full delivery).

use enum_dispatch::enum_dispatch;

use crate::fulfillment::traits::{CommandContext, EventApplier, FulfillmentError};
use crate::fulfillment::transitions::order_transition_allowed;
use shared::fulfillment::{EventPayload, FulfillmentEvent, OrderSnapshot, OrderStatus};

mod assignment_accepted;
mod assignment_advanced;
mod assignment_cancelled;
mod assignment_rejected;
mod delivery_confirmed;
mod delivery_verified;
mod farm_assigned;
mod invoice_approved;
mod invoice_created;
mod invoice_paid;
mod invoice_reviewed;
mod order_cancelled;
mod order_completed;
mod order_created;
mod order_published;

pub use assignment_accepted::AssignmentAcceptedApplier;
pub use assignment_advanced::AssignmentAdvancedApplier;
pub use assignment_cancelled::AssignmentCancelledApplier;
pub use assignment_rejected::AssignmentRejectedApplier;
pub use delivery_confirmed::DeliveryConfirmedApplier;
pub use delivery_verified::DeliveryVerifiedApplier;
pub use farm_assigned::FarmAssignedApplier;
pub use invoice_approved::InvoiceApprovedApplier;
pub use invoice_created::InvoiceCreatedApplier;
pub use invoice_paid::InvoicePaidApplier;
pub use invoice_reviewed::{InvoiceDisputedApplier, InvoiceRejectedApplier};
pub use order_cancelled::OrderCancelledApplier;
pub use order_completed::OrderCompletedApplier;
pub use order_created::OrderCreatedApplier;
pub use order_published::OrderPublishedApplier;

/// EventAction enum - dispatches to concrete applier implementations
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderCreated(OrderCreatedApplier),
    OrderPublished(OrderPublishedApplier),
    OrderCancelled(OrderCancelledApplier),
    OrderCompleted(OrderCompletedApplier),
    FarmAssigned(FarmAssignedApplier),
    AssignmentAccepted(AssignmentAcceptedApplier),
    AssignmentRejected(AssignmentRejectedApplier),
    AssignmentAdvanced(AssignmentAdvancedApplier),
    AssignmentCancelled(AssignmentCancelledApplier),
    DeliveryConfirmed(DeliveryConfirmedApplier),
    DeliveryVerified(DeliveryVerifiedApplier),
    InvoiceCreated(InvoiceCreatedApplier),
    InvoiceApproved(InvoiceApprovedApplier),
    InvoiceRejected(InvoiceRejectedApplier),
    InvoiceDisputed(InvoiceDisputedApplier),
    InvoicePaid(InvoicePaidApplier),
}

/// Convert a FulfillmentEvent reference to its applier.
///
/// This is the ONLY place that matches on EventPayload for dispatch.
impl From<&FulfillmentEvent> for EventAction {
    fn from(event: &FulfillmentEvent) -> Self {
        match &event.payload {
            EventPayload::OrderCreated { .. } => EventAction::OrderCreated(OrderCreatedApplier),
            EventPayload::OrderPublished { .. } => {
                EventAction::OrderPublished(OrderPublishedApplier)
            }
            EventPayload::OrderCancelled { .. } => {
                EventAction::OrderCancelled(OrderCancelledApplier)
            }
            EventPayload::OrderCompleted { .. } => {
                EventAction::OrderCompleted(OrderCompletedApplier)
            }
            EventPayload::FarmAssigned { .. } => EventAction::FarmAssigned(FarmAssignedApplier),
            EventPayload::AssignmentAccepted { .. } => {
                EventAction::AssignmentAccepted(AssignmentAcceptedApplier)
            }
            EventPayload::AssignmentRejected { .. } => {
                EventAction::AssignmentRejected(AssignmentRejectedApplier)
            }
            EventPayload::AssignmentAdvanced { .. } => {
                EventAction::AssignmentAdvanced(AssignmentAdvancedApplier)
            }
            EventPayload::AssignmentCancelled { .. } => {
                EventAction::AssignmentCancelled(AssignmentCancelledApplier)
            }
            EventPayload::DeliveryConfirmed { .. } => {
                EventAction::DeliveryConfirmed(DeliveryConfirmedApplier)
            }
            EventPayload::DeliveryVerified { .. } => {
                EventAction::DeliveryVerified(DeliveryVerifiedApplier)
            }
            EventPayload::InvoiceCreated { .. } => {
                EventAction::InvoiceCreated(InvoiceCreatedApplier)
            }
            EventPayload::InvoiceApproved { .. } => {
                EventAction::InvoiceApproved(InvoiceApprovedApplier)
            }
            EventPayload::InvoiceRejected { .. } => {
                EventAction::InvoiceRejected(InvoiceRejectedApplier)
            }
            EventPayload::InvoiceDisputed { .. } => {
                EventAction::InvoiceDisputed(InvoiceDisputedApplier)
            }
            EventPayload::InvoicePaid { .. } => EventAction::InvoicePaid(InvoicePaidApplier),
        }
    }
}

/// Apply an event to the context via its applier
pub fn apply_event(
    ctx: &mut CommandContext<'_>,
    event: &FulfillmentEvent,
) -> Result<(), FulfillmentError> {
    let applier: EventAction = event.into();
    applier.apply(ctx, event)
}

/// Advance an order's roll-up status after a delivery-quantity change.
///
/// Steps through the legal chain only: assigning/assigned → in_progress
/// → partially_delivered → fully_delivered. Terminal states are never
/// touched.
pub(crate) fn advance_order_delivery_status(order: &mut OrderSnapshot) {
    if order.quantity_delivered > 0
        && matches!(
            order.status,
            OrderStatus::Assigning | OrderStatus::Assigned
        )
        && order_transition_allowed(order.status, OrderStatus::InProgress)
    {
        order.status = OrderStatus::InProgress;
    }
    if order.quantity_delivered > 0
        && order.status == OrderStatus::InProgress
        && order_transition_allowed(order.status, OrderStatus::PartiallyDelivered)
    {
        order.status = OrderStatus::PartiallyDelivered;
    }
    if order.status == OrderStatus::PartiallyDelivered
        && order.quantity_assigned > 0
        && order.quantity_delivered >= order.quantity_assigned
        && order_transition_allowed(order.status, OrderStatus::FullyDelivered)
    {
        order.status = OrderStatus::FullyDelivered;
    }
}
