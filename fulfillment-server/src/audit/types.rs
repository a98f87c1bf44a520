//! Audit log type definitions
//!
//! Core data structures of the append-only audit trail. All entries are
//! immutable and hash-chained for tamper evidence.

use serde::{Deserialize, Serialize};
use shared::fulfillment::FulfillmentEventType;

/// Audited operation type (enumerated, not free text)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ Order lifecycle ═══
    OrderCreated,
    OrderPublished,
    OrderCompleted,
    OrderCancelled,

    // ═══ Assignments ═══
    FarmAssigned,
    AssignmentAccepted,
    AssignmentRejected,
    AssignmentAdvanced,
    AssignmentCancelled,

    // ═══ Deliveries ═══
    DeliveryConfirmed,
    DeliveryVerified,

    // ═══ Invoices (financially critical) ═══
    InvoiceCreated,
    InvoiceApproved,
    InvoiceRejected,
    InvoiceDisputed,
    PaymentProcessed,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<FulfillmentEventType> for AuditAction {
    fn from(value: FulfillmentEventType) -> Self {
        match value {
            FulfillmentEventType::OrderCreated => AuditAction::OrderCreated,
            FulfillmentEventType::OrderPublished => AuditAction::OrderPublished,
            FulfillmentEventType::OrderCompleted => AuditAction::OrderCompleted,
            FulfillmentEventType::OrderCancelled => AuditAction::OrderCancelled,
            FulfillmentEventType::FarmAssigned => AuditAction::FarmAssigned,
            FulfillmentEventType::AssignmentAccepted => AuditAction::AssignmentAccepted,
            FulfillmentEventType::AssignmentRejected => AuditAction::AssignmentRejected,
            FulfillmentEventType::AssignmentAdvanced => AuditAction::AssignmentAdvanced,
            FulfillmentEventType::AssignmentCancelled => AuditAction::AssignmentCancelled,
            FulfillmentEventType::DeliveryConfirmed => AuditAction::DeliveryConfirmed,
            FulfillmentEventType::DeliveryVerified => AuditAction::DeliveryVerified,
            FulfillmentEventType::InvoiceCreated => AuditAction::InvoiceCreated,
            FulfillmentEventType::InvoiceApproved => AuditAction::InvoiceApproved,
            FulfillmentEventType::InvoiceRejected => AuditAction::InvoiceRejected,
            FulfillmentEventType::InvoiceDisputed => AuditAction::InvoiceDisputed,
            FulfillmentEventType::InvoicePaid => AuditAction::PaymentProcessed,
        }
    }
}

/// Audit log entry (immutable)
///
/// Each record carries a SHA-256 hash chain:
/// - `prev_hash`: hash of the previous record
/// - `curr_hash`: hash of this record (covers prev_hash + all fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Globally increasing sequence number (unique id)
    pub id: u64,
    /// Timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Operation type
    pub action: AuditAction,
    /// Resource type ("order", "assignment", "delivery", "invoice")
    pub resource_type: String,
    /// Resource id the operation targeted
    pub resource_id: String,
    /// Acting user id (None for system events)
    pub actor_id: Option<String>,
    /// Acting user name snapshot
    pub actor_name: Option<String>,
    /// Aggregate state before the operation (JSON snapshot)
    pub previous_state: Option<serde_json::Value>,
    /// Aggregate state after the operation (JSON snapshot)
    pub new_state: Option<serde_json::Value>,
    /// Hash of the previous audit entry
    pub prev_hash: String,
    /// Hash of this entry (SHA-256)
    pub curr_hash: String,
}

/// Audit log query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    /// Start time (Unix milliseconds, inclusive)
    pub from: Option<i64>,
    /// End time (Unix milliseconds, inclusive)
    pub to: Option<i64>,
    /// Filter by operation type
    pub action: Option<AuditAction>,
    /// Filter by acting user
    pub actor_id: Option<String>,
    /// Filter by resource type
    pub resource_type: Option<String>,
    /// Filter by resource id
    pub resource_id: Option<String>,
    /// Pagination offset
    #[serde(default)]
    pub offset: usize,
    /// Page size (default 50)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Audit chain verification result
#[derive(Debug, Serialize)]
pub struct AuditChainVerification {
    /// Number of entries verified
    pub total_entries: u64,
    /// Whether the chain is intact
    pub chain_intact: bool,
    /// Break points, if any
    pub breaks: Vec<AuditChainBreak>,
}

/// A break in the audit chain
#[derive(Debug, Serialize)]
pub struct AuditChainBreak {
    /// Sequence number at the break
    pub entry_id: u64,
    /// Expected hash at this position
    pub expected_hash: String,
    /// Hash actually stored
    pub actual_hash: String,
}
