//! State machine engine
//!
//! One authoritative transition table per aggregate. Every status change
//! in the system goes through `ensure_*_transition`; a transition absent
//! from the table fails with a typed error naming the current and the
//! attempted state, before anything is written.

use shared::fulfillment::{AssignmentStatus, InvoiceStatus, OrderStatus};

use super::traits::FulfillmentError;

/// Legal order transitions
pub fn order_transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match (from, to) {
        (Draft, Published) => true,
        (Published, Assigning) => true,
        (Assigning, Assigned) => true,
        // A rejected or cancelled assignment reopens allocation
        (Assigned, Assigning) => true,
        // Partial allocation is legal: progress can start before the order
        // is fully assigned
        (Assigning, InProgress) => true,
        (Assigned, InProgress) => true,
        (InProgress, PartiallyDelivered) => true,
        (PartiallyDelivered, FullyDelivered) => true,
        (FullyDelivered, Completed) => true,
        // Cancellation from any non-terminal state
        (from, Cancelled) => !from.is_terminal(),
        _ => false,
    }
}

/// Legal assignment transitions
pub fn assignment_transition_allowed(from: AssignmentStatus, to: AssignmentStatus) -> bool {
    use AssignmentStatus::*;
    match (from, to) {
        (Pending, Accepted) => true,
        // Rejection only before acceptance
        (Pending, Rejected) => true,
        (Accepted, Preparing) => true,
        (Preparing, Ready) => true,
        (Ready, InTransit) => true,
        (InTransit, Delivered) => true,
        (Delivered, Verified) => true,
        // Only the payment operation emits this transition
        (Verified, Paid) => true,
        // Cancellation from any pre-delivery state
        (Pending | Accepted | Preparing | Ready | InTransit, Cancelled) => true,
        _ => false,
    }
}

/// Legal invoice transitions
pub fn invoice_transition_allowed(from: InvoiceStatus, to: InvoiceStatus) -> bool {
    use InvoiceStatus::*;
    match (from, to) {
        (Pending, Approved) => true,
        (Approved, Processing) => true,
        (Processing, Paid) => true,
        (Pending | Approved, Rejected) => true,
        (Pending | Approved, Disputed) => true,
        // A resolved dispute re-enters review
        (Disputed, Approved) => true,
        (Disputed, Rejected) => true,
        _ => false,
    }
}

/// Validate an order transition, rejecting anything not in the table
pub fn ensure_order_transition(
    from: OrderStatus,
    to: OrderStatus,
) -> Result<(), FulfillmentError> {
    if order_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(FulfillmentError::InvalidStateTransition {
            entity: "order",
            from: from.to_string(),
            attempted: to.to_string(),
        })
    }
}

/// Validate an assignment transition
pub fn ensure_assignment_transition(
    from: AssignmentStatus,
    to: AssignmentStatus,
) -> Result<(), FulfillmentError> {
    if assignment_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(FulfillmentError::InvalidStateTransition {
            entity: "assignment",
            from: from.to_string(),
            attempted: to.to_string(),
        })
    }
}

/// Validate an invoice transition
pub fn ensure_invoice_transition(
    from: InvoiceStatus,
    to: InvoiceStatus,
) -> Result<(), FulfillmentError> {
    if invoice_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(FulfillmentError::InvalidStateTransition {
            entity: "invoice",
            from: from.to_string(),
            attempted: to.to_string(),
        })
    }
}

/// Delivery-progress status an order should carry for the given totals.
///
/// `FullyDelivered` requires every assigned unit delivered; anything
/// above zero is `PartiallyDelivered`.
pub fn delivery_progress_status(assigned: u32, delivered: u32) -> Option<OrderStatus> {
    if delivered == 0 {
        None
    } else if delivered >= assigned {
        Some(OrderStatus::FullyDelivered)
    } else {
        Some(OrderStatus::PartiallyDelivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_happy_path_is_legal() {
        use OrderStatus::*;
        let path = [
            Draft,
            Published,
            Assigning,
            Assigned,
            InProgress,
            PartiallyDelivered,
            FullyDelivered,
            Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                order_transition_allowed(pair[0], pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn rejected_allocation_reopens_assigning() {
        assert!(order_transition_allowed(
            OrderStatus::Assigned,
            OrderStatus::Assigning
        ));
        assert!(!order_transition_allowed(
            OrderStatus::InProgress,
            OrderStatus::Assigning
        ));
    }

    #[test]
    fn order_cannot_skip_to_completed() {
        assert!(!order_transition_allowed(
            OrderStatus::Draft,
            OrderStatus::Completed
        ));
        assert!(!order_transition_allowed(
            OrderStatus::InProgress,
            OrderStatus::Completed
        ));
    }

    #[test]
    fn cancelled_is_reachable_from_any_non_terminal_order_state() {
        use OrderStatus::*;
        for from in [
            Draft,
            Published,
            Assigning,
            Assigned,
            InProgress,
            PartiallyDelivered,
            FullyDelivered,
        ] {
            assert!(order_transition_allowed(from, Cancelled), "{from}");
        }
        assert!(!order_transition_allowed(Completed, Cancelled));
        assert!(!order_transition_allowed(Cancelled, Cancelled));
    }

    #[test]
    fn publish_only_from_draft() {
        use OrderStatus::*;
        assert!(order_transition_allowed(Draft, Published));
        for from in [Published, Assigning, Assigned, InProgress, Completed, Cancelled] {
            assert!(!order_transition_allowed(from, Published), "{from}");
        }
    }

    #[test]
    fn assignment_rejection_only_from_pending() {
        use AssignmentStatus::*;
        assert!(assignment_transition_allowed(Pending, Rejected));
        for from in [Accepted, Preparing, Ready, InTransit, Delivered, Verified, Paid] {
            assert!(!assignment_transition_allowed(from, Rejected), "{from}");
        }
    }

    #[test]
    fn assignment_cancellation_blocked_once_delivered() {
        use AssignmentStatus::*;
        for from in [Pending, Accepted, Preparing, Ready, InTransit] {
            assert!(assignment_transition_allowed(from, Cancelled), "{from}");
        }
        for from in [Delivered, Verified, Paid, Rejected] {
            assert!(!assignment_transition_allowed(from, Cancelled), "{from}");
        }
    }

    #[test]
    fn paid_only_reachable_from_verified() {
        use AssignmentStatus::*;
        assert!(assignment_transition_allowed(Verified, Paid));
        for from in [Pending, Accepted, Preparing, Ready, InTransit, Delivered] {
            assert!(!assignment_transition_allowed(from, Paid), "{from}");
        }
    }

    #[test]
    fn invoice_dispute_paths() {
        use InvoiceStatus::*;
        assert!(invoice_transition_allowed(Pending, Disputed));
        assert!(invoice_transition_allowed(Approved, Disputed));
        assert!(invoice_transition_allowed(Disputed, Approved));
        assert!(invoice_transition_allowed(Disputed, Rejected));
        assert!(!invoice_transition_allowed(Paid, Disputed));
        assert!(!invoice_transition_allowed(Processing, Disputed));
    }

    #[test]
    fn ensure_reports_current_and_attempted_state() {
        let err = ensure_order_transition(OrderStatus::Published, OrderStatus::Published)
            .unwrap_err();
        match err {
            FulfillmentError::InvalidStateTransition {
                entity,
                from,
                attempted,
            } => {
                assert_eq!(entity, "order");
                assert_eq!(from, "PUBLISHED");
                assert_eq!(attempted, "PUBLISHED");
            }
            other => panic!("Expected InvalidStateTransition, got {:?}", other),
        }
    }

    #[test]
    fn delivery_progress_thresholds() {
        assert_eq!(delivery_progress_status(5000, 0), None);
        assert_eq!(
            delivery_progress_status(5000, 1),
            Some(OrderStatus::PartiallyDelivered)
        );
        assert_eq!(
            delivery_progress_status(5000, 4999),
            Some(OrderStatus::PartiallyDelivered)
        );
        assert_eq!(
            delivery_progress_status(5000, 5000),
            Some(OrderStatus::FullyDelivered)
        );
    }
}
