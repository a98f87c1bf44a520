//! Fulfillment events - immutable facts recorded after command processing

use serde::{Deserialize, Serialize};

use super::types::AssignmentStage;
use crate::fulfillment::ProductType;

/// Fulfillment event - immutable record of a committed state change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (authoritative ordering)
    pub sequence: u64,
    /// Order this event belongs to (every aggregate rolls up to an order)
    pub order_id: String,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Actor who triggered this event
    pub actor_id: String,
    /// Actor name (snapshot for audit)
    pub actor_name: String,
    /// Command that produced this event
    pub command_id: String,
    /// Event type
    pub event_type: FulfillmentEventType,
    /// Event payload
    pub payload: EventPayload,
}

impl FulfillmentEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        order_id: String,
        actor_id: String,
        actor_name: String,
        command_id: String,
        event_type: FulfillmentEventType,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            timestamp: crate::util::now_millis(),
            actor_id,
            actor_name,
            command_id,
            event_type,
            payload,
        }
    }
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentEventType {
    // Order lifecycle
    OrderCreated,
    OrderPublished,
    OrderCompleted,
    OrderCancelled,

    // Assignments
    FarmAssigned,
    AssignmentAccepted,
    AssignmentRejected,
    AssignmentAdvanced,
    AssignmentCancelled,

    // Deliveries
    DeliveryConfirmed,
    DeliveryVerified,

    // Invoices
    InvoiceCreated,
    InvoiceApproved,
    InvoiceRejected,
    InvoiceDisputed,
    InvoicePaid,
}

impl std::fmt::Display for FulfillmentEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FulfillmentEventType::OrderCreated => "ORDER_CREATED",
            FulfillmentEventType::OrderPublished => "ORDER_PUBLISHED",
            FulfillmentEventType::OrderCompleted => "ORDER_COMPLETED",
            FulfillmentEventType::OrderCancelled => "ORDER_CANCELLED",
            FulfillmentEventType::FarmAssigned => "FARM_ASSIGNED",
            FulfillmentEventType::AssignmentAccepted => "ASSIGNMENT_ACCEPTED",
            FulfillmentEventType::AssignmentRejected => "ASSIGNMENT_REJECTED",
            FulfillmentEventType::AssignmentAdvanced => "ASSIGNMENT_ADVANCED",
            FulfillmentEventType::AssignmentCancelled => "ASSIGNMENT_CANCELLED",
            FulfillmentEventType::DeliveryConfirmed => "DELIVERY_CONFIRMED",
            FulfillmentEventType::DeliveryVerified => "DELIVERY_VERIFIED",
            FulfillmentEventType::InvoiceCreated => "INVOICE_CREATED",
            FulfillmentEventType::InvoiceApproved => "INVOICE_APPROVED",
            FulfillmentEventType::InvoiceRejected => "INVOICE_REJECTED",
            FulfillmentEventType::InvoiceDisputed => "INVOICE_DISPUTED",
            FulfillmentEventType::InvoicePaid => "INVOICE_PAID",
        };
        write!(f, "{}", s)
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Order lifecycle ==========
    OrderCreated {
        order_number: String,
        product_type: ProductType,
        quantity_needed: u32,
        unit_price: f64,
        total_budget: f64,
        delivery_deadline: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        preferred_region: Option<String>,
    },

    OrderPublished {},

    OrderCompleted {},

    OrderCancelled {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Assignments ==========
    FarmAssigned {
        assignment_id: String,
        assignment_number: String,
        farm_id: String,
        farm_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        settlement_account: Option<String>,
        quantity: u32,
        unit_price: f64,
        /// True when produced by auto-assignment
        #[serde(default)]
        auto_assigned: bool,
    },

    AssignmentAccepted {
        assignment_id: String,
    },

    AssignmentRejected {
        assignment_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    AssignmentAdvanced {
        assignment_id: String,
        stage: AssignmentStage,
        #[serde(skip_serializing_if = "Option::is_none")]
        readiness_date: Option<i64>,
    },

    AssignmentCancelled {
        assignment_id: String,
        /// Quantity released back to the order's unallocated pool
        released_quantity: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Deliveries ==========
    DeliveryConfirmed {
        assignment_id: String,
        delivery_id: String,
        quantity: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        average_unit_weight_kg: Option<f64>,
        loss_count: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    DeliveryVerified {
        assignment_id: String,
        delivery_id: String,
        quality_passed: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    // ========== Invoices ==========
    InvoiceCreated {
        invoice_id: String,
        invoice_number: String,
        assignment_id: String,
        delivery_id: String,
        quantity: u32,
        unit_price: f64,
        subtotal: f64,
        quality_deduction: f64,
        loss_deduction: f64,
        other_deduction: f64,
        total: f64,
    },

    InvoiceApproved {
        invoice_id: String,
        assignment_id: String,
    },

    InvoiceRejected {
        invoice_id: String,
        assignment_id: String,
        reason: String,
    },

    InvoiceDisputed {
        invoice_id: String,
        assignment_id: String,
        reason: String,
    },

    InvoicePaid {
        invoice_id: String,
        assignment_id: String,
        amount: f64,
        payment_reference: String,
    },
}
