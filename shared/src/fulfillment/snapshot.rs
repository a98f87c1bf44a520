//! Aggregate snapshots - current state of each fulfillment aggregate
//!
//! Snapshots are the canonical persisted state. Derived quantities
//! (`quantity_assigned`, `quantity_delivered`) are kept consistent by the
//! orchestrator; clients treat them as read-only.

use serde::{Deserialize, Serialize};

use super::types::{AssignmentStatus, InvoiceStatus, OrderStatus, ProductType};

/// Government purchase order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order ID (opaque unique identifier)
    pub order_id: String,
    /// Human-readable order number, e.g. `PO-20260115-1003`.
    /// Derived, unique, immutable once assigned.
    pub order_number: String,
    pub product_type: ProductType,
    pub quantity_needed: u32,
    /// Default unit price offered to farms
    pub unit_price: f64,
    pub total_budget: f64,
    /// Delivery deadline (Unix milliseconds)
    pub delivery_deadline: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_region: Option<String>,
    pub status: OrderStatus,
    /// Sum over non-cancelled assignments; invariant: ≤ quantity_needed
    #[serde(default)]
    pub quantity_assigned: u32,
    /// Sum of confirmed deliveries; invariant: ≤ quantity_assigned
    #[serde(default)]
    pub quantity_delivered: u32,
    /// Officer who created the order
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl OrderSnapshot {
    /// Quantity still unallocated
    pub fn quantity_remaining(&self) -> u32 {
        self.quantity_needed.saturating_sub(self.quantity_assigned)
    }
}

/// One farm's committed share of an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentSnapshot {
    pub assignment_id: String,
    /// Derived from the order number plus a per-order sequence,
    /// e.g. `PO-20260115-1003-A2`
    pub assignment_number: String,
    pub order_id: String,
    pub farm_id: String,
    pub farm_name: String,
    /// Settlement account captured from the farm profile at assignment time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_account: Option<String>,
    pub quantity_assigned: u32,
    #[serde(default)]
    pub quantity_delivered: u32,
    /// May differ from the order default when negotiated per farm
    pub unit_price: f64,
    pub status: AssignmentStatus,
    /// Farm-committed readiness date (set when preparation starts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AssignmentSnapshot {
    /// Quantity still undelivered
    pub fn quantity_remaining(&self) -> u32 {
        self.quantity_assigned.saturating_sub(self.quantity_delivered)
    }
}

/// One physical delivery event against an assignment.
/// Immutable once verified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryConfirmation {
    pub delivery_id: String,
    pub assignment_id: String,
    pub order_id: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_unit_weight_kg: Option<f64>,
    /// Dead-on-arrival / loss count
    #[serde(default)]
    pub loss_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Quality inspection outcome; None until verified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<i64>,
    pub delivered_at: i64,
}

impl DeliveryConfirmation {
    pub fn is_verified(&self) -> bool {
        self.quality_passed.is_some()
    }
}

/// Financial claim derived from verified deliveries of one assignment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceSnapshot {
    pub invoice_id: String,
    /// Derived from the assignment number, e.g. `PO-20260115-1003-A2-I1`
    pub invoice_number: String,
    pub assignment_id: String,
    pub order_id: String,
    /// Delivery this invoice settles
    pub delivery_id: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub subtotal: f64,
    /// Deduction for failed quality inspection
    #[serde(default)]
    pub quality_deduction: f64,
    /// Deduction for mortality/loss, per bird
    #[serde(default)]
    pub loss_deduction: f64,
    /// Any other itemized deduction
    #[serde(default)]
    pub other_deduction: f64,
    /// subtotal − Σ deductions, floored at zero
    pub total: f64,
    pub status: InvoiceStatus,
    /// Actor whose verification created this invoice
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<i64>,
    /// Reference returned by the payment rail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl InvoiceSnapshot {
    pub fn total_deductions(&self) -> f64 {
        self.quality_deduction + self.loss_deduction + self.other_deduction
    }
}
