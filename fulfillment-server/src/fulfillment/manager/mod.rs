//! FulfillmentManager - the orchestrator behind every mutating operation
//!
//! Composes the lock manager, idempotency tracker, state machine engine
//! and ledger store so that each command is one atomic unit of work.
//!
//! # Command Flow
//!
//! ```text
//! execute(cmd)
//!     ├─ 1. Idempotency fast path (operation kind + command_id)
//!     ├─ 2. Acquire aggregate lease (order:{id} / invoice:{id})
//!     ├─ 3. Pre-fetch collaborator data (farm directory)
//!     ├─ 4. Begin write transaction, re-check idempotency
//!     ├─ 5. Permission check via access policy
//!     ├─ 6. Action validates and emits events
//!     ├─ 7. Appliers update snapshots; audit rows capture prev/new state
//!     ├─ 8. Persist snapshots + audit log + idempotency record
//!     ├─ 9. Commit, release lease
//!     └─ 10. Broadcast events, best-effort notify
//! ```
//!
//! Reads never take the lease and always see the last committed state.

mod error;
pub use error::*;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use redb::WriteTransaction;
use tokio::sync::broadcast;

use shared::farm::{FarmProfile, RecommendationOutcome};
use shared::fulfillment::{
    AssignmentSnapshot, AssignmentStage, AssignmentStatus, CommandError, CommandPayload,
    CommandResponse, DeliveryConfirmation, FulfillmentCommand, FulfillmentEvent, InvoiceSnapshot,
    OrderSnapshot,
};
use shared::util::now_millis;

use crate::audit::{AuditChainVerification, AuditEntry, AuditQuery};
use crate::fulfillment::actions::{
    AcceptAssignmentAction, AdvanceAssignmentAction, ApproveInvoiceAction, AssignFarmAction,
    AutoAssignAction, CancelAssignmentAction, CancelOrderAction, CommandAction,
    ConfirmDeliveryAction, CreateOrderAction, DisputeInvoiceAction, ProcessPaymentAction,
    PublishOrderAction, RejectAssignmentAction, RejectInvoiceAction, VerifyDeliveryAction,
};
use crate::fulfillment::appliers::apply_event;
use crate::fulfillment::locks::LockManager;
use crate::fulfillment::money::DeductionRates;
use crate::fulfillment::storage::{IdempotencyRecord, LedgerStore, OrderFilter};
use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::recommendation::{recommend, RecommendationConfig};
use crate::services::{AccessPolicy, FarmDirectory, Notifier, PaymentRail};

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Engine-level tunables, passed in at construction
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Max wait for a per-aggregate lease before `ResourceLocked`
    pub lock_wait: Duration,
    /// Lease lifetime; expired leases may be taken over
    pub lock_ttl: Duration,
    pub deduction_rates: DeductionRates,
    pub recommendation: RecommendationConfig,
    /// Invoice approver must differ from the invoice creator
    pub enforce_separation_of_duties: bool,
    /// Retention window for idempotency records
    pub idempotency_retention: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_wait: Duration::from_secs(5),
            lock_ttl: Duration::from_secs(30),
            deduction_rates: DeductionRates::default(),
            recommendation: RecommendationConfig::default(),
            enforce_separation_of_duties: true,
            idempotency_retention: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

/// Collaborator data fetched before the command transaction opens
#[derive(Default)]
struct Prefetched {
    pool: Vec<FarmProfile>,
    distress: HashMap<String, u8>,
    farm: Option<FarmProfile>,
}

/// FulfillmentManager for command processing and queries
pub struct FulfillmentManager {
    store: LedgerStore,
    locks: Arc<LockManager>,
    config: EngineConfig,
    directory: Arc<dyn FarmDirectory>,
    policy: Arc<dyn AccessPolicy>,
    rail: Arc<dyn PaymentRail>,
    notifier: Arc<dyn Notifier>,
    event_tx: broadcast::Sender<FulfillmentEvent>,
}

impl std::fmt::Debug for FulfillmentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FulfillmentManager {
    pub fn new(
        store: LedgerStore,
        config: EngineConfig,
        directory: Arc<dyn FarmDirectory>,
        policy: Arc<dyn AccessPolicy>,
        rail: Arc<dyn PaymentRail>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let locks = LockManager::new(config.lock_ttl);
        Self {
            store,
            locks,
            config,
            directory,
            policy,
            rail,
            notifier,
            event_tx,
        }
    }

    /// Subscribe to committed-event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<FulfillmentEvent> {
        self.event_tx.subscribe()
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn locks(&self) -> &Arc<LockManager> {
        &self.locks
    }

    /// Drop idempotency records older than the configured retention.
    /// Returns the number removed.
    pub fn purge_expired_idempotency(&self) -> ManagerResult<usize> {
        let cutoff = now_millis() - self.config.idempotency_retention.as_millis() as i64;
        Ok(self.store.purge_idempotency_before(cutoff)?)
    }

    // ========== Queries (never block on the lease) ==========

    pub fn get_order(&self, order_id: &str) -> ManagerResult<Option<OrderSnapshot>> {
        Ok(self.store.get_order(order_id)?)
    }

    pub fn get_order_by_number(&self, number: &str) -> ManagerResult<Option<OrderSnapshot>> {
        Ok(self.store.get_order_by_number(number)?)
    }

    pub fn list_orders(&self, filter: &OrderFilter) -> ManagerResult<Vec<OrderSnapshot>> {
        Ok(self.store.list_orders(filter)?)
    }

    pub fn get_assignment(&self, assignment_id: &str) -> ManagerResult<Option<AssignmentSnapshot>> {
        Ok(self.store.get_assignment(assignment_id)?)
    }

    pub fn assignments_for_order(
        &self,
        order_id: &str,
    ) -> ManagerResult<Vec<AssignmentSnapshot>> {
        Ok(self.store.assignments_for_order(order_id)?)
    }

    pub fn get_delivery(&self, delivery_id: &str) -> ManagerResult<Option<DeliveryConfirmation>> {
        Ok(self.store.get_delivery(delivery_id)?)
    }

    pub fn deliveries_for_assignment(
        &self,
        assignment_id: &str,
    ) -> ManagerResult<Vec<DeliveryConfirmation>> {
        Ok(self.store.deliveries_for_assignment(assignment_id)?)
    }

    pub fn get_invoice(&self, invoice_id: &str) -> ManagerResult<Option<InvoiceSnapshot>> {
        Ok(self.store.get_invoice(invoice_id)?)
    }

    pub fn invoices_for_assignment(
        &self,
        assignment_id: &str,
    ) -> ManagerResult<Vec<InvoiceSnapshot>> {
        Ok(self.store.invoices_for_assignment(assignment_id)?)
    }

    pub fn audit_trail(&self, query: &AuditQuery) -> ManagerResult<(Vec<AuditEntry>, u64)> {
        Ok(self.store.query_audit(query)?)
    }

    pub fn verify_audit_chain(&self) -> ManagerResult<AuditChainVerification> {
        Ok(self.store.verify_audit_chain()?)
    }

    /// Advisory recommendation for manual assignment
    pub async fn recommend_for_order(
        &self,
        order_id: &str,
    ) -> ManagerResult<RecommendationOutcome> {
        let order = self.store.get_order(order_id)?.ok_or_else(|| {
            ManagerError::Fulfillment(FulfillmentError::OrderNotFound(order_id.to_string()))
        })?;
        let prefetched = self.fetch_pool(&order).await;
        let assignments = self.store.assignments_for_order(order_id)?;
        let pool: Vec<FarmProfile> = prefetched
            .pool
            .into_iter()
            .filter(|farm| {
                !assignments.iter().any(|a| {
                    a.farm_id == farm.farm_id
                        && !matches!(
                            a.status,
                            AssignmentStatus::Cancelled | AssignmentStatus::Rejected
                        )
                })
            })
            .collect();
        Ok(recommend(
            &order,
            &pool,
            &prefetched.distress,
            &self.config.recommendation,
        ))
    }

    // ========== Command Processing ==========

    /// Execute a command and return the response
    pub async fn execute(&self, cmd: FulfillmentCommand) -> CommandResponse {
        match self.process(&cmd).await {
            Ok((response, events)) => {
                // Broadcast only after a successful commit; a notification
                // failure never rolls back the transition
                for event in &events {
                    self.notifier.notify(event);
                    if self.event_tx.send(event.clone()).is_err() {
                        tracing::trace!("Event broadcast skipped: no active receivers");
                    }
                }
                response
            }
            Err(err) => {
                tracing::warn!(command_id = %cmd.command_id, operation = cmd.payload.kind(), error = %err, "Command rejected");
                let mut error: CommandError = err.into();
                if error.current_state.is_none()
                    && let Some(state) = self.canonical_state(&cmd.payload)
                {
                    error = error.with_state(state);
                }
                CommandResponse::error(cmd.command_id, error)
            }
        }
    }

    /// Process a command and return response plus committed events
    async fn process(
        &self,
        cmd: &FulfillmentCommand,
    ) -> ManagerResult<(CommandResponse, Vec<FulfillmentEvent>)> {
        let operation = cmd.payload.kind();
        tracing::debug!(command_id = %cmd.command_id, operation, "Processing command");

        // 1. Idempotency fast path (before taking the lease)
        if let Some(record) = self.store.get_idempotency(operation, &cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, operation, "Duplicate command replayed");
            return Ok((record.response.as_duplicate(), vec![]));
        }

        // 2. Per-aggregate lease with bounded wait
        let _lease = match self.lock_key(&cmd.payload)? {
            Some(key) => Some(self.locks.acquire(&key, self.config.lock_wait).await?),
            None => None,
        };

        // 3. Collaborator reads happen outside the transaction; the order
        // state they are validated against is read inside it
        let prefetched = match &cmd.payload {
            CommandPayload::AutoAssign { order_id, .. } => {
                let order = self.store.get_order(order_id)?.ok_or_else(|| {
                    ManagerError::Fulfillment(FulfillmentError::OrderNotFound(order_id.clone()))
                })?;
                self.fetch_pool(&order).await
            }
            CommandPayload::AssignFarm {
                order_id, farm_id, ..
            } => {
                let order = self.store.get_order(order_id)?.ok_or_else(|| {
                    ManagerError::Fulfillment(FulfillmentError::OrderNotFound(order_id.clone()))
                })?;
                let farm = self
                    .directory
                    .eligible_farms(order.product_type)
                    .await
                    .into_iter()
                    .find(|f| f.farm_id == *farm_id);
                Prefetched {
                    farm,
                    ..Default::default()
                }
            }
            _ => Prefetched::default(),
        };

        // 4. Begin the write transaction and re-check idempotency under it
        let txn = self.store.begin_write()?;
        if let Some(record) = self
            .store
            .get_idempotency_txn(&txn, operation, &cmd.command_id)?
        {
            return Ok((record.response.as_duplicate(), vec![]));
        }

        let start_sequence = self.store.get_current_sequence()?;
        let mut ctx = CommandContext::new(&txn, &self.store, start_sequence);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            actor: cmd.actor.clone(),
            timestamp: cmd.timestamp,
        };

        // 5. Permission check before any state is touched
        self.check_permission(&mut ctx, cmd)?;

        // 6. Build and execute the action
        let action = self.build_action(&txn, cmd, prefetched)?;
        let events = action
            .execute(&mut ctx, &metadata)
            .await
            .map_err(ManagerError::from)?;

        // 7. Apply events, capturing before/after state for the audit log
        let mut audit_rows = Vec::with_capacity(events.len());
        for event in &events {
            let (resource_type, resource_id) = audit_resource(event);
            let previous_state = aggregate_json(&mut ctx, resource_type, &resource_id);
            apply_event(&mut ctx, event).map_err(ManagerError::from)?;
            let new_state = aggregate_json(&mut ctx, resource_type, &resource_id);
            audit_rows.push((event, resource_type, resource_id, previous_state, new_state));
        }

        // 8. Assemble the response while the context still holds the
        // uncommitted snapshots
        let response = self.build_response(&mut ctx, cmd, &events);

        // 9. Persist everything in this one transaction
        for order in ctx.modified_orders() {
            self.store.put_order(&txn, order)?;
        }
        for assignment in ctx.modified_assignments() {
            self.store.put_assignment(&txn, assignment)?;
        }
        for delivery in ctx.modified_deliveries() {
            self.store.put_delivery(&txn, delivery)?;
        }
        for invoice in ctx.modified_invoices() {
            self.store.put_invoice(&txn, invoice)?;
        }
        if ctx.current_sequence() > start_sequence {
            self.store.set_sequence(&txn, ctx.current_sequence())?;
        }
        for (event, resource_type, resource_id, previous_state, new_state) in audit_rows {
            self.store.append_audit(
                &txn,
                event.timestamp,
                event.event_type.into(),
                resource_type.to_string(),
                resource_id,
                Some(event.actor_id.clone()),
                Some(event.actor_name.clone()),
                previous_state,
                new_state,
            )?;
        }
        self.store.record_idempotency(
            &txn,
            &IdempotencyRecord {
                operation: operation.to_string(),
                command_id: cmd.command_id.clone(),
                response: response.clone(),
                completed_at: now_millis(),
            },
        )?;

        drop(ctx);
        txn.commit().map_err(crate::fulfillment::storage::StorageError::from)?;

        tracing::info!(
            command_id = %cmd.command_id,
            operation,
            event_count = events.len(),
            "Command committed"
        );
        Ok((response, events))
    }

    /// Lease name for the aggregate the operation mutates.
    ///
    /// Assignment- and delivery-scoped operations lock their order, so
    /// everything that can move an order's quantities serializes on one
    /// lease; invoice review and payment lock the invoice.
    fn lock_key(&self, payload: &CommandPayload) -> ManagerResult<Option<String>> {
        use CommandPayload::*;
        let key = match payload {
            CreateOrder { .. } => None,
            PublishOrder { order_id }
            | CancelOrder { order_id, .. }
            | AutoAssign { order_id, .. }
            | AssignFarm { order_id, .. } => Some(format!("order:{}", order_id)),
            AcceptAssignment { assignment_id }
            | RejectAssignment { assignment_id, .. }
            | StartPreparing { assignment_id, .. }
            | MarkReady { assignment_id }
            | StartTransit { assignment_id }
            | CancelAssignment { assignment_id, .. }
            | ConfirmDelivery { assignment_id, .. } => {
                let assignment = self.store.get_assignment(assignment_id)?.ok_or_else(|| {
                    ManagerError::Fulfillment(FulfillmentError::AssignmentNotFound(
                        assignment_id.clone(),
                    ))
                })?;
                Some(format!("order:{}", assignment.order_id))
            }
            VerifyDelivery { delivery_id, .. } => {
                let delivery = self.store.get_delivery(delivery_id)?.ok_or_else(|| {
                    ManagerError::Fulfillment(FulfillmentError::DeliveryNotFound(
                        delivery_id.clone(),
                    ))
                })?;
                Some(format!("order:{}", delivery.order_id))
            }
            ApproveInvoice { invoice_id }
            | RejectInvoice { invoice_id, .. }
            | DisputeInvoice { invoice_id, .. }
            | ProcessPayment { invoice_id } => Some(format!("invoice:{}", invoice_id)),
        };
        Ok(key)
    }

    /// Eligible pool plus distress scores for an order
    async fn fetch_pool(&self, order: &OrderSnapshot) -> Prefetched {
        let pool = self.directory.eligible_farms(order.product_type).await;
        let mut distress = HashMap::new();
        if self.config.recommendation.distress_bonus_enabled {
            for farm in &pool {
                if let Some(score) = self.directory.distress_score(&farm.farm_id).await {
                    distress.insert(farm.farm_id.clone(), score);
                }
            }
        }
        Prefetched {
            pool,
            distress,
            farm: None,
        }
    }

    /// Consult the access policy for the command's target aggregate
    fn check_permission(
        &self,
        ctx: &mut CommandContext<'_>,
        cmd: &FulfillmentCommand,
    ) -> ManagerResult<()> {
        use CommandPayload::*;
        let actor = &cmd.actor;
        let allowed = match &cmd.payload {
            CreateOrder { .. } => self.policy.can_create_order(actor),
            PublishOrder { order_id }
            | CancelOrder { order_id, .. }
            | AutoAssign { order_id, .. }
            | AssignFarm { order_id, .. } => {
                let order = ctx.order(order_id).map_err(ManagerError::from)?;
                self.policy.can_manage(actor, &order)
            }
            AcceptAssignment { assignment_id }
            | RejectAssignment { assignment_id, .. }
            | StartPreparing { assignment_id, .. }
            | MarkReady { assignment_id }
            | StartTransit { assignment_id }
            | ConfirmDelivery { assignment_id, .. } => {
                let assignment = ctx.assignment(assignment_id).map_err(ManagerError::from)?;
                self.policy.can_act_on_assignment(actor, &assignment)
            }
            CancelAssignment { assignment_id, .. } => {
                let assignment = ctx.assignment(assignment_id).map_err(ManagerError::from)?;
                let order = ctx.order(&assignment.order_id).map_err(ManagerError::from)?;
                self.policy.can_manage(actor, &order)
            }
            VerifyDelivery { delivery_id, .. } => {
                let delivery = ctx.delivery(delivery_id).map_err(ManagerError::from)?;
                let order = ctx.order(&delivery.order_id).map_err(ManagerError::from)?;
                self.policy.can_manage(actor, &order)
            }
            ApproveInvoice { invoice_id }
            | RejectInvoice { invoice_id, .. }
            | ProcessPayment { invoice_id } => {
                let invoice = ctx.invoice(invoice_id).map_err(ManagerError::from)?;
                let order = ctx.order(&invoice.order_id).map_err(ManagerError::from)?;
                self.policy.can_manage(actor, &order)
            }
            DisputeInvoice { invoice_id, .. } => {
                let invoice = ctx.invoice(invoice_id).map_err(ManagerError::from)?;
                let assignment = ctx
                    .assignment(&invoice.assignment_id)
                    .map_err(ManagerError::from)?;
                self.policy.can_act_on_assignment(actor, &assignment)
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(ManagerError::PermissionDenied(format!(
                "actor {} may not perform {}",
                actor.id,
                cmd.payload.kind()
            )))
        }
    }

    /// Convert the command payload to its action, injecting engine
    /// configuration and pre-fetched collaborator data
    fn build_action(
        &self,
        txn: &WriteTransaction,
        cmd: &FulfillmentCommand,
        prefetched: Prefetched,
    ) -> ManagerResult<CommandAction> {
        use CommandPayload::*;
        let action = match &cmd.payload {
            CreateOrder {
                product_type,
                quantity_needed,
                unit_price,
                total_budget,
                delivery_deadline,
                preferred_region,
            } => CommandAction::CreateOrder(CreateOrderAction {
                product_type: *product_type,
                quantity_needed: *quantity_needed,
                unit_price: *unit_price,
                total_budget: *total_budget,
                delivery_deadline: *delivery_deadline,
                preferred_region: preferred_region.clone(),
                order_number: self.store.next_order_number(txn)?,
            }),
            PublishOrder { order_id } => CommandAction::PublishOrder(PublishOrderAction {
                order_id: order_id.clone(),
            }),
            CancelOrder { order_id, reason } => CommandAction::CancelOrder(CancelOrderAction {
                order_id: order_id.clone(),
                reason: reason.clone(),
            }),
            AutoAssign {
                order_id,
                max_farms,
            } => CommandAction::AutoAssign(AutoAssignAction {
                order_id: order_id.clone(),
                pool: prefetched.pool,
                distress: prefetched.distress,
                config: self.config.recommendation.clone(),
                max_farms: *max_farms,
            }),
            AssignFarm {
                order_id,
                farm_id,
                quantity,
                unit_price,
            } => CommandAction::AssignFarm(AssignFarmAction {
                order_id: order_id.clone(),
                farm_id: farm_id.clone(),
                quantity: *quantity,
                unit_price: *unit_price,
                farm: prefetched.farm,
            }),
            AcceptAssignment { assignment_id } => {
                CommandAction::AcceptAssignment(AcceptAssignmentAction {
                    assignment_id: assignment_id.clone(),
                })
            }
            RejectAssignment {
                assignment_id,
                reason,
            } => CommandAction::RejectAssignment(RejectAssignmentAction {
                assignment_id: assignment_id.clone(),
                reason: reason.clone(),
            }),
            StartPreparing {
                assignment_id,
                readiness_date,
            } => CommandAction::AdvanceAssignment(AdvanceAssignmentAction {
                assignment_id: assignment_id.clone(),
                stage: AssignmentStage::Preparing,
                readiness_date: Some(*readiness_date),
            }),
            MarkReady { assignment_id } => {
                CommandAction::AdvanceAssignment(AdvanceAssignmentAction {
                    assignment_id: assignment_id.clone(),
                    stage: AssignmentStage::Ready,
                    readiness_date: None,
                })
            }
            StartTransit { assignment_id } => {
                CommandAction::AdvanceAssignment(AdvanceAssignmentAction {
                    assignment_id: assignment_id.clone(),
                    stage: AssignmentStage::InTransit,
                    readiness_date: None,
                })
            }
            CancelAssignment {
                assignment_id,
                reason,
            } => CommandAction::CancelAssignment(CancelAssignmentAction {
                assignment_id: assignment_id.clone(),
                reason: reason.clone(),
            }),
            ConfirmDelivery {
                assignment_id,
                delivery,
            } => CommandAction::ConfirmDelivery(ConfirmDeliveryAction {
                assignment_id: assignment_id.clone(),
                delivery: delivery.clone(),
            }),
            VerifyDelivery {
                delivery_id,
                verification,
            } => CommandAction::VerifyDelivery(VerifyDeliveryAction {
                delivery_id: delivery_id.clone(),
                verification: verification.clone(),
                rates: self.config.deduction_rates,
            }),
            ApproveInvoice { invoice_id } => CommandAction::ApproveInvoice(ApproveInvoiceAction {
                invoice_id: invoice_id.clone(),
                enforce_separation_of_duties: self.config.enforce_separation_of_duties,
            }),
            RejectInvoice { invoice_id, reason } => {
                CommandAction::RejectInvoice(RejectInvoiceAction {
                    invoice_id: invoice_id.clone(),
                    reason: reason.clone(),
                })
            }
            DisputeInvoice { invoice_id, reason } => {
                CommandAction::DisputeInvoice(DisputeInvoiceAction {
                    invoice_id: invoice_id.clone(),
                    reason: reason.clone(),
                })
            }
            ProcessPayment { invoice_id } => CommandAction::ProcessPayment(ProcessPaymentAction {
                invoice_id: invoice_id.clone(),
                rail: self.rail.clone(),
            }),
        };
        Ok(action)
    }

    /// Attach the post-commit state of every aggregate the operation
    /// touched, so callers never need a follow-up read
    fn build_response(
        &self,
        ctx: &mut CommandContext<'_>,
        cmd: &FulfillmentCommand,
        events: &[FulfillmentEvent],
    ) -> CommandResponse {
        use shared::fulfillment::EventPayload;

        let mut response = CommandResponse::success(cmd.command_id.clone());
        if let Some(event) = events.first() {
            response.order = ctx.order(&event.order_id).ok();
        }

        let assignment_id: Option<String> = match &cmd.payload {
            CommandPayload::AcceptAssignment { assignment_id }
            | CommandPayload::RejectAssignment { assignment_id, .. }
            | CommandPayload::StartPreparing { assignment_id, .. }
            | CommandPayload::MarkReady { assignment_id }
            | CommandPayload::StartTransit { assignment_id }
            | CommandPayload::CancelAssignment { assignment_id, .. }
            | CommandPayload::ConfirmDelivery { assignment_id, .. } => {
                Some(assignment_id.clone())
            }
            _ => events.iter().find_map(|e| match &e.payload {
                EventPayload::FarmAssigned { assignment_id, .. } if events.len() == 1 => {
                    Some(assignment_id.clone())
                }
                EventPayload::DeliveryVerified { assignment_id, .. } => {
                    Some(assignment_id.clone())
                }
                EventPayload::InvoiceApproved { assignment_id, .. }
                | EventPayload::InvoiceRejected { assignment_id, .. }
                | EventPayload::InvoiceDisputed { assignment_id, .. }
                | EventPayload::InvoicePaid { assignment_id, .. } => Some(assignment_id.clone()),
                _ => None,
            }),
        };
        if let Some(id) = assignment_id {
            response.assignment = ctx.assignment(&id).ok();
        }

        let delivery_id: Option<String> = events.iter().find_map(|e| match &e.payload {
            EventPayload::DeliveryConfirmed { delivery_id, .. }
            | EventPayload::DeliveryVerified { delivery_id, .. } => Some(delivery_id.clone()),
            _ => None,
        });
        if let Some(id) = delivery_id {
            response.delivery = ctx.delivery(&id).ok();
        }

        let invoice_id: Option<String> = match &cmd.payload {
            CommandPayload::ApproveInvoice { invoice_id }
            | CommandPayload::RejectInvoice { invoice_id, .. }
            | CommandPayload::DisputeInvoice { invoice_id, .. }
            | CommandPayload::ProcessPayment { invoice_id } => Some(invoice_id.clone()),
            _ => events.iter().find_map(|e| match &e.payload {
                EventPayload::InvoiceCreated { invoice_id, .. } => Some(invoice_id.clone()),
                _ => None,
            }),
        };
        if let Some(id) = invoice_id {
            response.invoice = ctx.invoice(&id).ok();
        }

        response.recommendation = ctx.take_recommendation();
        response
    }

    /// Best-effort canonical state of the target aggregate for error
    /// responses
    fn canonical_state(&self, payload: &CommandPayload) -> Option<serde_json::Value> {
        use CommandPayload::*;
        match payload {
            CreateOrder { .. } => None,
            PublishOrder { order_id }
            | CancelOrder { order_id, .. }
            | AutoAssign { order_id, .. }
            | AssignFarm { order_id, .. } => self
                .store
                .get_order(order_id)
                .ok()
                .flatten()
                .and_then(|o| serde_json::to_value(o).ok()),
            AcceptAssignment { assignment_id }
            | RejectAssignment { assignment_id, .. }
            | StartPreparing { assignment_id, .. }
            | MarkReady { assignment_id }
            | StartTransit { assignment_id }
            | CancelAssignment { assignment_id, .. }
            | ConfirmDelivery { assignment_id, .. } => self
                .store
                .get_assignment(assignment_id)
                .ok()
                .flatten()
                .and_then(|a| serde_json::to_value(a).ok()),
            VerifyDelivery { delivery_id, .. } => self
                .store
                .get_delivery(delivery_id)
                .ok()
                .flatten()
                .and_then(|d| serde_json::to_value(d).ok()),
            ApproveInvoice { invoice_id }
            | RejectInvoice { invoice_id, .. }
            | DisputeInvoice { invoice_id, .. }
            | ProcessPayment { invoice_id } => self
                .store
                .get_invoice(invoice_id)
                .ok()
                .flatten()
                .and_then(|i| serde_json::to_value(i).ok()),
        }
    }
}

/// Primary aggregate an event should be audited against
fn audit_resource(event: &FulfillmentEvent) -> (&'static str, String) {
    use shared::fulfillment::EventPayload::*;
    match &event.payload {
        OrderCreated { .. } | OrderPublished {} | OrderCompleted {} | OrderCancelled { .. } => {
            ("order", event.order_id.clone())
        }
        FarmAssigned { assignment_id, .. }
        | AssignmentAccepted { assignment_id }
        | AssignmentRejected { assignment_id, .. }
        | AssignmentAdvanced { assignment_id, .. }
        | AssignmentCancelled { assignment_id, .. } => ("assignment", assignment_id.clone()),
        DeliveryConfirmed { delivery_id, .. } | DeliveryVerified { delivery_id, .. } => {
            ("delivery", delivery_id.clone())
        }
        InvoiceCreated { invoice_id, .. }
        | InvoiceApproved { invoice_id, .. }
        | InvoiceRejected { invoice_id, .. }
        | InvoiceDisputed { invoice_id, .. }
        | InvoicePaid { invoice_id, .. } => ("invoice", invoice_id.clone()),
    }
}

/// JSON snapshot of an aggregate as currently visible in the context
fn aggregate_json(
    ctx: &mut CommandContext<'_>,
    resource_type: &str,
    resource_id: &str,
) -> Option<serde_json::Value> {
    match resource_type {
        "order" => ctx
            .order(resource_id)
            .ok()
            .and_then(|o| serde_json::to_value(o).ok()),
        "assignment" => ctx
            .assignment(resource_id)
            .ok()
            .and_then(|a| serde_json::to_value(a).ok()),
        "delivery" => ctx
            .delivery(resource_id)
            .ok()
            .and_then(|d| serde_json::to_value(d).ok()),
        "invoice" => ctx
            .invoice(resource_id)
            .ok()
            .and_then(|i| serde_json::to_value(i).ok()),
        _ => None,
    }
}
