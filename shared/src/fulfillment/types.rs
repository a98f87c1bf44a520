//! Shared types for the fulfillment engine

use serde::{Deserialize, Serialize};

use super::snapshot::{
    AssignmentSnapshot, DeliveryConfirmation, InvoiceSnapshot, OrderSnapshot,
};
use crate::farm::RecommendationOutcome;

// ============================================================================
// Product Types
// ============================================================================

/// Poultry product categories handled by bulk purchase orders
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Broiler,
    Layer,
    TableEgg,
    DayOldChick,
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductType::Broiler => write!(f, "BROILER"),
            ProductType::Layer => write!(f, "LAYER"),
            ProductType::TableEgg => write!(f, "TABLE_EGG"),
            ProductType::DayOldChick => write!(f, "DAY_OLD_CHICK"),
        }
    }
}

// ============================================================================
// Aggregate Status Enums
// ============================================================================

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Draft,
    Published,
    Assigning,
    Assigned,
    InProgress,
    PartiallyDelivered,
    FullyDelivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Draft => "DRAFT",
            OrderStatus::Published => "PUBLISHED",
            OrderStatus::Assigning => "ASSIGNING",
            OrderStatus::Assigned => "ASSIGNED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::PartiallyDelivered => "PARTIALLY_DELIVERED",
            OrderStatus::FullyDelivered => "FULLY_DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Assignment lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    #[default]
    Pending,
    Accepted,
    Preparing,
    Ready,
    InTransit,
    Delivered,
    Verified,
    Paid,
    Rejected,
    Cancelled,
}

impl AssignmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AssignmentStatus::Paid | AssignmentStatus::Rejected | AssignmentStatus::Cancelled
        )
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssignmentStatus::Pending => "PENDING",
            AssignmentStatus::Accepted => "ACCEPTED",
            AssignmentStatus::Preparing => "PREPARING",
            AssignmentStatus::Ready => "READY",
            AssignmentStatus::InTransit => "IN_TRANSIT",
            AssignmentStatus::Delivered => "DELIVERED",
            AssignmentStatus::Verified => "VERIFIED",
            AssignmentStatus::Paid => "PAID",
            AssignmentStatus::Rejected => "REJECTED",
            AssignmentStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Assignment progress stages a farm reports between acceptance and delivery
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStage {
    Preparing,
    Ready,
    InTransit,
}

/// Invoice payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Approved,
    Processing,
    Paid,
    Rejected,
    Disputed,
}

impl InvoiceStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Rejected)
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Approved => "APPROVED",
            InvoiceStatus::Processing => "PROCESSING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Rejected => "REJECTED",
            InvoiceStatus::Disputed => "DISPUTED",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Command Inputs
// ============================================================================

/// One physical delivery reported against an assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryInput {
    /// Units delivered in this event
    pub quantity: u32,
    /// Average unit weight in kilograms, if weighed at the gate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_unit_weight_kg: Option<f64>,
    /// Dead-on-arrival / loss count for this delivery
    #[serde(default)]
    pub loss_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Quality verification outcome for a delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationInput {
    /// Whether the delivery passed quality inspection. A failing
    /// inspection still verifies the delivery but drives deductions.
    pub quality_passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// ============================================================================
// Command Response
// ============================================================================

/// Response to a fulfillment command
///
/// Carries the post-commit state of every aggregate the operation touched
/// so callers never need a follow-up read, plus `is_duplicate` when the
/// idempotency layer replayed a previously recorded result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// True when this response was replayed from the idempotency tracker
    #[serde(default)]
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<AssignmentSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryConfirmation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceSnapshot>,
    /// Allocation summary for auto-assignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<RecommendationOutcome>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            is_duplicate: false,
            order: None,
            assignment: None,
            delivery: None,
            invoice: None,
            recommendation: None,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            is_duplicate: false,
            order: None,
            assignment: None,
            delivery: None,
            invoice: None,
            recommendation: None,
            error: Some(error),
        }
    }

    /// Mark a replayed response as a duplicate of the original
    pub fn as_duplicate(mut self) -> Self {
        self.is_duplicate = true;
        self
    }
}

/// Command error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
    /// Canonical state of the target aggregate at the time of failure,
    /// so the caller can reconcile without a follow-up read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<serde_json::Value>,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            current_state: None,
        }
    }

    pub fn with_state(mut self, state: serde_json::Value) -> Self {
        self.current_state = Some(state);
        self
    }
}

/// Command error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    InvalidStateTransition,
    ValidationError,
    PermissionDenied,
    ResourceLocked,
    OrderNotFound,
    AssignmentNotFound,
    DeliveryNotFound,
    InvoiceNotFound,
    FarmNotEligible,
    DuplicateAssignment,
    PaymentRailFailed,
    TransactionFailed,
    // Storage errors
    StorageFull,
    StorageCorrupted,
    SystemBusy,
    InternalError,
}

impl CommandErrorCode {
    /// Whether a caller should retry the operation with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CommandErrorCode::ResourceLocked
                | CommandErrorCode::TransactionFailed
                | CommandErrorCode::SystemBusy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_flag_preserves_payload() {
        let mut resp = CommandResponse::success("cmd-1".to_string());
        resp.order = None;
        let dup = resp.clone().as_duplicate();
        assert!(dup.is_duplicate);
        assert!(dup.success);
        assert_eq!(dup.command_id, resp.command_id);
    }

    #[test]
    fn retryable_codes() {
        assert!(CommandErrorCode::ResourceLocked.is_retryable());
        assert!(CommandErrorCode::TransactionFailed.is_retryable());
        assert!(!CommandErrorCode::InvalidStateTransition.is_retryable());
        assert!(!CommandErrorCode::PermissionDenied.is_retryable());
    }

    #[test]
    fn status_serialization_is_screaming_snake() {
        let s = serde_json::to_string(&OrderStatus::PartiallyDelivered).unwrap();
        assert_eq!(s, "\"PARTIALLY_DELIVERED\"");
        let s = serde_json::to_string(&AssignmentStatus::InTransit).unwrap();
        assert_eq!(s, "\"IN_TRANSIT\"");
    }
}
