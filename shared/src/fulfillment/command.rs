//! Fulfillment commands - requests from clients to mutate aggregates
//!
//! `command_id` doubles as the idempotency key: resubmitting a command
//! with the same id replays the recorded response instead of executing
//! the operation again.

use serde::{Deserialize, Serialize};

use super::types::{DeliveryInput, ProductType, VerificationInput};
use crate::actor::Actor;
use crate::util::now_millis;

/// Fulfillment command envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentCommand {
    /// Unique command ID, also the idempotency key
    pub command_id: String,
    /// Resolved caller identity
    pub actor: Actor,
    /// Client timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Command payload
    pub payload: CommandPayload,
}

impl FulfillmentCommand {
    /// Create a command with a generated id and the current timestamp
    pub fn new(actor: Actor, payload: CommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            actor,
            timestamp: now_millis(),
            payload,
        }
    }

    /// Create a command with a caller-supplied idempotency key
    pub fn with_command_id(
        command_id: impl Into<String>,
        actor: Actor,
        payload: CommandPayload,
    ) -> Self {
        Self {
            command_id: command_id.into(),
            actor,
            timestamp: now_millis(),
            payload,
        }
    }
}

/// Command payload variants, one per mutating operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandPayload {
    // ========== Order lifecycle ==========
    CreateOrder {
        product_type: ProductType,
        quantity_needed: u32,
        unit_price: f64,
        total_budget: f64,
        /// Delivery deadline (Unix milliseconds)
        delivery_deadline: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        preferred_region: Option<String>,
    },
    PublishOrder {
        order_id: String,
    },
    CancelOrder {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Assignment ==========
    AutoAssign {
        order_id: String,
        /// Cap on the number of farms, overriding the configured default
        #[serde(skip_serializing_if = "Option::is_none")]
        max_farms: Option<usize>,
    },
    AssignFarm {
        order_id: String,
        farm_id: String,
        quantity: u32,
        /// Negotiated unit price; falls back to the order default
        #[serde(skip_serializing_if = "Option::is_none")]
        unit_price: Option<f64>,
    },
    AcceptAssignment {
        assignment_id: String,
    },
    RejectAssignment {
        assignment_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    StartPreparing {
        assignment_id: String,
        /// Farm-committed readiness date (Unix milliseconds)
        readiness_date: i64,
    },
    MarkReady {
        assignment_id: String,
    },
    StartTransit {
        assignment_id: String,
    },
    CancelAssignment {
        assignment_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Delivery ==========
    ConfirmDelivery {
        assignment_id: String,
        delivery: DeliveryInput,
    },
    VerifyDelivery {
        delivery_id: String,
        verification: VerificationInput,
    },

    // ========== Invoice / payment ==========
    ApproveInvoice {
        invoice_id: String,
    },
    RejectInvoice {
        invoice_id: String,
        reason: String,
    },
    DisputeInvoice {
        invoice_id: String,
        reason: String,
    },
    ProcessPayment {
        invoice_id: String,
    },
}

impl CommandPayload {
    /// Stable operation kind, used for idempotency scoping and audit
    pub fn kind(&self) -> &'static str {
        match self {
            CommandPayload::CreateOrder { .. } => "create_order",
            CommandPayload::PublishOrder { .. } => "publish_order",
            CommandPayload::CancelOrder { .. } => "cancel_order",
            CommandPayload::AutoAssign { .. } => "auto_assign",
            CommandPayload::AssignFarm { .. } => "assign_farm",
            CommandPayload::AcceptAssignment { .. } => "accept_assignment",
            CommandPayload::RejectAssignment { .. } => "reject_assignment",
            CommandPayload::StartPreparing { .. } => "start_preparing",
            CommandPayload::MarkReady { .. } => "mark_ready",
            CommandPayload::StartTransit { .. } => "start_transit",
            CommandPayload::CancelAssignment { .. } => "cancel_assignment",
            CommandPayload::ConfirmDelivery { .. } => "confirm_delivery",
            CommandPayload::VerifyDelivery { .. } => "verify_delivery",
            CommandPayload::ApproveInvoice { .. } => "approve_invoice",
            CommandPayload::RejectInvoice { .. } => "reject_invoice",
            CommandPayload::DisputeInvoice { .. } => "dispute_invoice",
            CommandPayload::ProcessPayment { .. } => "process_payment",
        }
    }
}
