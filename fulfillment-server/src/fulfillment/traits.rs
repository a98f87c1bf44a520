//! Core traits and context for command processing
//!
//! `CommandHandler` implementations validate a command against current
//! state and emit events; `EventApplier` implementations mutate snapshots
//! from those events. The `CommandContext` gives both a transactional,
//! cache-backed view of the ledger so every read inside one command sees
//! the same uncommitted state.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use redb::WriteTransaction;
use shared::Actor;
use shared::farm::RecommendationOutcome;
use shared::fulfillment::{
    AssignmentSnapshot, DeliveryConfirmation, FulfillmentEvent, InvoiceSnapshot, OrderSnapshot,
};

use super::storage::{LedgerStore, StorageError};

/// Typed failure of a fulfillment operation.
///
/// Everything here is detected before any write happens; the only
/// post-validation failure mode is `Storage`.
#[derive(Debug, thiserror::Error)]
pub enum FulfillmentError {
    #[error("Illegal {entity} transition from {from} to {attempted}")]
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        attempted: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Assignment not found: {0}")]
    AssignmentNotFound(String),

    #[error("Delivery not found: {0}")]
    DeliveryNotFound(String),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    #[error("Farm {farm_id} is not eligible: {reason}")]
    FarmNotEligible { farm_id: String, reason: String },

    #[error("Farm {farm_id} already holds an active assignment on order {order_id}")]
    DuplicateAssignment { order_id: String, farm_id: String },

    #[error("Payment rail failure: {0}")]
    PaymentRail(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Command metadata passed to every handler
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub actor: Actor,
    pub timestamp: i64,
}

/// Transactional view of the ledger for one command.
///
/// Reads go through a write-through cache so a handler and the appliers
/// that follow it observe each other's uncommitted changes. Everything
/// marked dirty is persisted in the same transaction by the manager.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    store: &'a LedgerStore,
    sequence: u64,
    orders: HashMap<String, OrderSnapshot>,
    assignments: HashMap<String, AssignmentSnapshot>,
    deliveries: HashMap<String, DeliveryConfirmation>,
    invoices: HashMap<String, InvoiceSnapshot>,
    dirty_orders: HashSet<String>,
    dirty_assignments: HashSet<String>,
    dirty_deliveries: HashSet<String>,
    dirty_invoices: HashSet<String>,
    recommendation: Option<RecommendationOutcome>,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, store: &'a LedgerStore, current_sequence: u64) -> Self {
        Self {
            txn,
            store,
            sequence: current_sequence,
            orders: HashMap::new(),
            assignments: HashMap::new(),
            deliveries: HashMap::new(),
            invoices: HashMap::new(),
            dirty_orders: HashSet::new(),
            dirty_assignments: HashSet::new(),
            dirty_deliveries: HashSet::new(),
            dirty_invoices: HashSet::new(),
            recommendation: None,
        }
    }

    /// Allocate the next global sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Highest sequence number allocated so far
    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    pub fn store(&self) -> &LedgerStore {
        self.store
    }

    pub fn txn(&self) -> &WriteTransaction {
        self.txn
    }

    // ========== Orders ==========

    pub fn order(&mut self, order_id: &str) -> Result<OrderSnapshot, FulfillmentError> {
        if let Some(order) = self.orders.get(order_id) {
            return Ok(order.clone());
        }
        let order = self
            .store
            .get_order_txn(self.txn, order_id)?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
        self.orders.insert(order_id.to_string(), order.clone());
        Ok(order)
    }

    pub fn save_order(&mut self, order: OrderSnapshot) {
        self.dirty_orders.insert(order.order_id.clone());
        self.orders.insert(order.order_id.clone(), order);
    }

    // ========== Assignments ==========

    pub fn assignment(
        &mut self,
        assignment_id: &str,
    ) -> Result<AssignmentSnapshot, FulfillmentError> {
        if let Some(assignment) = self.assignments.get(assignment_id) {
            return Ok(assignment.clone());
        }
        let assignment = self
            .store
            .get_assignment_txn(self.txn, assignment_id)?
            .ok_or_else(|| FulfillmentError::AssignmentNotFound(assignment_id.to_string()))?;
        self.assignments
            .insert(assignment_id.to_string(), assignment.clone());
        Ok(assignment)
    }

    pub fn save_assignment(&mut self, assignment: AssignmentSnapshot) {
        self.dirty_assignments
            .insert(assignment.assignment_id.clone());
        self.assignments
            .insert(assignment.assignment_id.clone(), assignment);
    }

    /// All assignments of an order, overlaying cached (possibly new or
    /// modified) snapshots on top of the stored index
    pub fn assignments_for_order(
        &mut self,
        order_id: &str,
    ) -> Result<Vec<AssignmentSnapshot>, FulfillmentError> {
        let mut by_id: HashMap<String, AssignmentSnapshot> = HashMap::new();
        for id in self.store.assignment_ids_for_order_txn(self.txn, order_id)? {
            if let Some(cached) = self.assignments.get(&id) {
                by_id.insert(id, cached.clone());
            } else if let Some(stored) = self.store.get_assignment_txn(self.txn, &id)? {
                self.assignments.insert(id.clone(), stored.clone());
                by_id.insert(id, stored);
            }
        }
        for (id, cached) in &self.assignments {
            if cached.order_id == order_id {
                by_id.entry(id.clone()).or_insert_with(|| cached.clone());
            }
        }
        let mut assignments: Vec<_> = by_id.into_values().collect();
        assignments.sort_by(|a, b| a.assignment_number.cmp(&b.assignment_number));
        Ok(assignments)
    }

    /// Number of assignments ever created for an order (cancelled ones
    /// included, so assignment numbers are never reused)
    pub fn assignment_count_for_order(&mut self, order_id: &str) -> Result<usize, FulfillmentError> {
        Ok(self.assignments_for_order(order_id)?.len())
    }

    /// The non-cancelled assignment a farm holds on an order, if any
    pub fn active_assignment_for_farm(
        &mut self,
        order_id: &str,
        farm_id: &str,
    ) -> Result<Option<AssignmentSnapshot>, FulfillmentError> {
        use shared::fulfillment::AssignmentStatus;
        Ok(self
            .assignments_for_order(order_id)?
            .into_iter()
            .find(|a| {
                a.farm_id == farm_id
                    && !matches!(
                        a.status,
                        AssignmentStatus::Cancelled | AssignmentStatus::Rejected
                    )
            }))
    }

    // ========== Deliveries ==========

    pub fn delivery(
        &mut self,
        delivery_id: &str,
    ) -> Result<DeliveryConfirmation, FulfillmentError> {
        if let Some(delivery) = self.deliveries.get(delivery_id) {
            return Ok(delivery.clone());
        }
        let delivery = self
            .store
            .get_delivery_txn(self.txn, delivery_id)?
            .ok_or_else(|| FulfillmentError::DeliveryNotFound(delivery_id.to_string()))?;
        self.deliveries
            .insert(delivery_id.to_string(), delivery.clone());
        Ok(delivery)
    }

    pub fn save_delivery(&mut self, delivery: DeliveryConfirmation) {
        self.dirty_deliveries.insert(delivery.delivery_id.clone());
        self.deliveries
            .insert(delivery.delivery_id.clone(), delivery);
    }

    /// All deliveries of an assignment, cache overlaid on the index
    pub fn deliveries_for_assignment(
        &mut self,
        assignment_id: &str,
    ) -> Result<Vec<DeliveryConfirmation>, FulfillmentError> {
        let mut by_id: HashMap<String, DeliveryConfirmation> = HashMap::new();
        for id in self
            .store
            .delivery_ids_for_assignment_txn(self.txn, assignment_id)?
        {
            if let Some(cached) = self.deliveries.get(&id) {
                by_id.insert(id, cached.clone());
            } else if let Some(stored) = self.store.get_delivery_txn(self.txn, &id)? {
                self.deliveries.insert(id.clone(), stored.clone());
                by_id.insert(id, stored);
            }
        }
        for (id, cached) in &self.deliveries {
            if cached.assignment_id == assignment_id {
                by_id.entry(id.clone()).or_insert_with(|| cached.clone());
            }
        }
        let mut deliveries: Vec<_> = by_id.into_values().collect();
        deliveries.sort_by_key(|d| d.delivered_at);
        Ok(deliveries)
    }

    // ========== Invoices ==========

    pub fn invoice(&mut self, invoice_id: &str) -> Result<InvoiceSnapshot, FulfillmentError> {
        if let Some(invoice) = self.invoices.get(invoice_id) {
            return Ok(invoice.clone());
        }
        let invoice = self
            .store
            .get_invoice_txn(self.txn, invoice_id)?
            .ok_or_else(|| FulfillmentError::InvoiceNotFound(invoice_id.to_string()))?;
        self.invoices
            .insert(invoice_id.to_string(), invoice.clone());
        Ok(invoice)
    }

    pub fn save_invoice(&mut self, invoice: InvoiceSnapshot) {
        self.dirty_invoices.insert(invoice.invoice_id.clone());
        self.invoices.insert(invoice.invoice_id.clone(), invoice);
    }

    /// All invoices of an assignment, cache overlaid on the index
    pub fn invoices_for_assignment(
        &mut self,
        assignment_id: &str,
    ) -> Result<Vec<InvoiceSnapshot>, FulfillmentError> {
        let mut by_id: HashMap<String, InvoiceSnapshot> = HashMap::new();
        for id in self
            .store
            .invoice_ids_for_assignment_txn(self.txn, assignment_id)?
        {
            if let Some(cached) = self.invoices.get(&id) {
                by_id.insert(id, cached.clone());
            } else if let Some(stored) = self.store.get_invoice_txn(self.txn, &id)? {
                self.invoices.insert(id.clone(), stored.clone());
                by_id.insert(id, stored);
            }
        }
        for (id, cached) in &self.invoices {
            if cached.assignment_id == assignment_id {
                by_id.entry(id.clone()).or_insert_with(|| cached.clone());
            }
        }
        let mut invoices: Vec<_> = by_id.into_values().collect();
        invoices.sort_by(|a, b| a.invoice_number.cmp(&b.invoice_number));
        Ok(invoices)
    }

    /// All invoices across every assignment of an order
    pub fn invoices_for_order(
        &mut self,
        order_id: &str,
    ) -> Result<Vec<InvoiceSnapshot>, FulfillmentError> {
        let mut invoices = Vec::new();
        let assignment_ids: Vec<String> = self
            .assignments_for_order(order_id)?
            .into_iter()
            .map(|a| a.assignment_id)
            .collect();
        for assignment_id in assignment_ids {
            invoices.extend(self.invoices_for_assignment(&assignment_id)?);
        }
        Ok(invoices)
    }

    // ========== Allocation outcome (auto-assignment) ==========

    /// Stash the allocation summary for the command response
    pub fn set_recommendation(&mut self, outcome: RecommendationOutcome) {
        self.recommendation = Some(outcome);
    }

    pub fn take_recommendation(&mut self) -> Option<RecommendationOutcome> {
        self.recommendation.take()
    }

    // ========== Persistence hooks for the manager ==========

    pub fn modified_orders(&self) -> impl Iterator<Item = &OrderSnapshot> {
        self.dirty_orders
            .iter()
            .filter_map(|id| self.orders.get(id))
    }

    pub fn modified_assignments(&self) -> impl Iterator<Item = &AssignmentSnapshot> {
        self.dirty_assignments
            .iter()
            .filter_map(|id| self.assignments.get(id))
    }

    pub fn modified_deliveries(&self) -> impl Iterator<Item = &DeliveryConfirmation> {
        self.dirty_deliveries
            .iter()
            .filter_map(|id| self.deliveries.get(id))
    }

    pub fn modified_invoices(&self) -> impl Iterator<Item = &InvoiceSnapshot> {
        self.dirty_invoices
            .iter()
            .filter_map(|id| self.invoices.get(id))
    }
}

/// Command handlers validate and emit events; they never write
#[async_trait]
pub trait CommandHandler {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<FulfillmentEvent>, FulfillmentError>;
}

/// Event appliers mutate snapshots from committed-to-be events.
/// Appliers are mechanical: all validation happened in the handler.
#[enum_dispatch::enum_dispatch]
pub trait EventApplier {
    fn apply(
        &self,
        ctx: &mut CommandContext<'_>,
        event: &FulfillmentEvent,
    ) -> Result<(), FulfillmentError>;
}
