//! redb-based ledger storage
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `OrderSnapshot` | Purchase orders |
//! | `order_numbers` | `order_number` | `order_id` | Number → id lookup |
//! | `assignments` | `assignment_id` | `AssignmentSnapshot` | Farm assignments |
//! | `order_assignments` | `(order_id, assignment_id)` | `()` | Reverse index |
//! | `deliveries` | `delivery_id` | `DeliveryConfirmation` | Delivery events |
//! | `assignment_deliveries` | `(assignment_id, delivery_id)` | `()` | Reverse index |
//! | `invoices` | `invoice_id` | `InvoiceSnapshot` | Financial claims |
//! | `assignment_invoices` | `(assignment_id, invoice_id)` | `()` | Reverse index |
//! | `audit_log` | `id` | `AuditEntry` | Append-only audit trail |
//! | `idempotency` | `"kind:command_id"` | `IdempotencyRecord` | Duplicate detection |
//! | `sequence_counter` | name | `u64` | Global sequence, counters |
//! | `meta` | name | string | Audit chain head |
//!
//! # Durability
//!
//! redb commits are durable as soon as `commit()` returns (copy-on-write
//! with atomic pointer swap), so a command is either fully applied across
//! every table above or not at all.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::fulfillment::{
    AssignmentSnapshot, CommandResponse, DeliveryConfirmation, InvoiceSnapshot, OrderSnapshot,
    OrderStatus,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::audit::{
    entry_hash, AuditChainBreak, AuditChainVerification, AuditEntry, AuditQuery, GENESIS_HASH,
};

const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");
const ORDER_NUMBERS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("order_numbers");
const ASSIGNMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("assignments");
const ORDER_ASSIGNMENTS_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("order_assignments");
const DELIVERIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("deliveries");
const ASSIGNMENT_DELIVERIES_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("assignment_deliveries");
const INVOICES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("invoices");
const ASSIGNMENT_INVOICES_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("assignment_invoices");
const AUDIT_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_log");
const IDEMPOTENCY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("idempotency");
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");
const META_TABLE: TableDefinition<&str, &str> = TableDefinition::new("meta");

const SEQUENCE_KEY: &str = "seq";
const ORDER_COUNT_KEY: &str = "order_count";
const AUDIT_SEQ_KEY: &str = "audit_seq";
const AUDIT_HEAD_KEY: &str = "audit_head";

/// Recorded outcome of a completed operation, replayed on duplicates
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IdempotencyRecord {
    /// Operation kind (e.g. `process_payment`)
    pub operation: String,
    pub command_id: String,
    /// Response returned to the original caller
    pub response: CommandResponse,
    /// Completion timestamp (Unix milliseconds)
    pub completed_at: i64,
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Filters for order listing
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub region: Option<String>,
    pub created_by: Option<String>,
}

/// Ledger storage backed by redb
#[derive(Clone)]
pub struct LedgerStore {
    db: Arc<Database>,
}

impl LedgerStore {
    /// Open or create the ledger at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory ledger (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(ASSIGNMENTS_TABLE)?;
            let _ = write_txn.open_table(ORDER_ASSIGNMENTS_TABLE)?;
            let _ = write_txn.open_table(DELIVERIES_TABLE)?;
            let _ = write_txn.open_table(ASSIGNMENT_DELIVERIES_TABLE)?;
            let _ = write_txn.open_table(INVOICES_TABLE)?;
            let _ = write_txn.open_table(ASSIGNMENT_INVOICES_TABLE)?;
            let _ = write_txn.open_table(AUDIT_TABLE)?;
            let _ = write_txn.open_table(IDEMPOTENCY_TABLE)?;
            let _ = write_txn.open_table(META_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Current global sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table.get(SEQUENCE_KEY)?.map(|g| g.value()).unwrap_or(0))
    }

    /// Set global sequence (within transaction)
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    /// Allocate the next order number within the command transaction.
    ///
    /// Failed commands roll the counter back with the rest of the
    /// transaction, so numbers are only burned by committed orders.
    pub fn next_order_number(&self, txn: &WriteTransaction) -> StorageResult<String> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table.get(ORDER_COUNT_KEY)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(ORDER_COUNT_KEY, next)?;
        Ok(format!(
            "PO-{}-{}",
            shared::util::today_compact(),
            1000 + next
        ))
    }

    // ========== Order Operations ==========

    pub fn put_order(&self, txn: &WriteTransaction, order: &OrderSnapshot) -> StorageResult<()> {
        let value = serde_json::to_vec(order)?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            table.insert(order.order_id.as_str(), value.as_slice())?;
        }
        let mut numbers = txn.open_table(ORDER_NUMBERS_TABLE)?;
        numbers.insert(order.order_number.as_str(), order.order_id.as_str())?;
        Ok(())
    }

    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderSnapshot>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_order_by_number(&self, order_number: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let numbers = read_txn.open_table(ORDER_NUMBERS_TABLE)?;
        let Some(id) = numbers.get(order_number)?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };
        drop(numbers);
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List orders matching the filter, newest first
    pub fn list_orders(&self, filter: &OrderFilter) -> StorageResult<Vec<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: OrderSnapshot = serde_json::from_slice(value.value())?;
            if let Some(status) = filter.status
                && order.status != status
            {
                continue;
            }
            if let Some(region) = &filter.region
                && order.preferred_region.as_deref() != Some(region.as_str())
            {
                continue;
            }
            if let Some(created_by) = &filter.created_by
                && order.created_by != *created_by
            {
                continue;
            }
            orders.push(order);
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    // ========== Assignment Operations ==========

    pub fn put_assignment(
        &self,
        txn: &WriteTransaction,
        assignment: &AssignmentSnapshot,
    ) -> StorageResult<()> {
        let value = serde_json::to_vec(assignment)?;
        {
            let mut table = txn.open_table(ASSIGNMENTS_TABLE)?;
            table.insert(assignment.assignment_id.as_str(), value.as_slice())?;
        }
        let mut index = txn.open_table(ORDER_ASSIGNMENTS_TABLE)?;
        index.insert(
            (
                assignment.order_id.as_str(),
                assignment.assignment_id.as_str(),
            ),
            (),
        )?;
        Ok(())
    }

    pub fn get_assignment(&self, assignment_id: &str) -> StorageResult<Option<AssignmentSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ASSIGNMENTS_TABLE)?;
        match table.get(assignment_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_assignment_txn(
        &self,
        txn: &WriteTransaction,
        assignment_id: &str,
    ) -> StorageResult<Option<AssignmentSnapshot>> {
        let table = txn.open_table(ASSIGNMENTS_TABLE)?;
        match table.get(assignment_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn assignment_ids_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Vec<String>> {
        let index = txn.open_table(ORDER_ASSIGNMENTS_TABLE)?;
        let mut ids = Vec::new();
        let range_start = (order_id, "");
        let range_end = (order_id, "\u{10FFFF}");
        for result in index.range(range_start..=range_end)? {
            let (key, _value) = result?;
            ids.push(key.value().1.to_string());
        }
        Ok(ids)
    }

    /// All assignments of an order (read-only)
    pub fn assignments_for_order(&self, order_id: &str) -> StorageResult<Vec<AssignmentSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ORDER_ASSIGNMENTS_TABLE)?;
        let mut ids = Vec::new();
        for result in index.range((order_id, "")..=(order_id, "\u{10FFFF}"))? {
            let (key, _value) = result?;
            ids.push(key.value().1.to_string());
        }
        drop(index);

        let table = read_txn.open_table(ASSIGNMENTS_TABLE)?;
        let mut assignments = Vec::new();
        for id in ids {
            if let Some(value) = table.get(id.as_str())? {
                assignments.push(serde_json::from_slice(value.value())?);
            }
        }
        assignments.sort_by(|a: &AssignmentSnapshot, b: &AssignmentSnapshot| {
            a.assignment_number.cmp(&b.assignment_number)
        });
        Ok(assignments)
    }

    // ========== Delivery Operations ==========

    pub fn put_delivery(
        &self,
        txn: &WriteTransaction,
        delivery: &DeliveryConfirmation,
    ) -> StorageResult<()> {
        let value = serde_json::to_vec(delivery)?;
        {
            let mut table = txn.open_table(DELIVERIES_TABLE)?;
            table.insert(delivery.delivery_id.as_str(), value.as_slice())?;
        }
        let mut index = txn.open_table(ASSIGNMENT_DELIVERIES_TABLE)?;
        index.insert(
            (
                delivery.assignment_id.as_str(),
                delivery.delivery_id.as_str(),
            ),
            (),
        )?;
        Ok(())
    }

    pub fn get_delivery(&self, delivery_id: &str) -> StorageResult<Option<DeliveryConfirmation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DELIVERIES_TABLE)?;
        match table.get(delivery_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_delivery_txn(
        &self,
        txn: &WriteTransaction,
        delivery_id: &str,
    ) -> StorageResult<Option<DeliveryConfirmation>> {
        let table = txn.open_table(DELIVERIES_TABLE)?;
        match table.get(delivery_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn delivery_ids_for_assignment_txn(
        &self,
        txn: &WriteTransaction,
        assignment_id: &str,
    ) -> StorageResult<Vec<String>> {
        let index = txn.open_table(ASSIGNMENT_DELIVERIES_TABLE)?;
        let mut ids = Vec::new();
        for result in index.range((assignment_id, "")..=(assignment_id, "\u{10FFFF}"))? {
            let (key, _value) = result?;
            ids.push(key.value().1.to_string());
        }
        Ok(ids)
    }

    /// All deliveries of an assignment (read-only)
    pub fn deliveries_for_assignment(
        &self,
        assignment_id: &str,
    ) -> StorageResult<Vec<DeliveryConfirmation>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ASSIGNMENT_DELIVERIES_TABLE)?;
        let mut ids = Vec::new();
        for result in index.range((assignment_id, "")..=(assignment_id, "\u{10FFFF}"))? {
            let (key, _value) = result?;
            ids.push(key.value().1.to_string());
        }
        drop(index);

        let table = read_txn.open_table(DELIVERIES_TABLE)?;
        let mut deliveries: Vec<DeliveryConfirmation> = Vec::new();
        for id in ids {
            if let Some(value) = table.get(id.as_str())? {
                deliveries.push(serde_json::from_slice(value.value())?);
            }
        }
        deliveries.sort_by_key(|d| d.delivered_at);
        Ok(deliveries)
    }

    // ========== Invoice Operations ==========

    pub fn put_invoice(
        &self,
        txn: &WriteTransaction,
        invoice: &InvoiceSnapshot,
    ) -> StorageResult<()> {
        let value = serde_json::to_vec(invoice)?;
        {
            let mut table = txn.open_table(INVOICES_TABLE)?;
            table.insert(invoice.invoice_id.as_str(), value.as_slice())?;
        }
        let mut index = txn.open_table(ASSIGNMENT_INVOICES_TABLE)?;
        index.insert(
            (invoice.assignment_id.as_str(), invoice.invoice_id.as_str()),
            (),
        )?;
        Ok(())
    }

    pub fn get_invoice(&self, invoice_id: &str) -> StorageResult<Option<InvoiceSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVOICES_TABLE)?;
        match table.get(invoice_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_invoice_txn(
        &self,
        txn: &WriteTransaction,
        invoice_id: &str,
    ) -> StorageResult<Option<InvoiceSnapshot>> {
        let table = txn.open_table(INVOICES_TABLE)?;
        match table.get(invoice_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn invoice_ids_for_assignment_txn(
        &self,
        txn: &WriteTransaction,
        assignment_id: &str,
    ) -> StorageResult<Vec<String>> {
        let index = txn.open_table(ASSIGNMENT_INVOICES_TABLE)?;
        let mut ids = Vec::new();
        for result in index.range((assignment_id, "")..=(assignment_id, "\u{10FFFF}"))? {
            let (key, _value) = result?;
            ids.push(key.value().1.to_string());
        }
        Ok(ids)
    }

    /// All invoices of an assignment (read-only)
    pub fn invoices_for_assignment(
        &self,
        assignment_id: &str,
    ) -> StorageResult<Vec<InvoiceSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ASSIGNMENT_INVOICES_TABLE)?;
        let mut ids = Vec::new();
        for result in index.range((assignment_id, "")..=(assignment_id, "\u{10FFFF}"))? {
            let (key, _value) = result?;
            ids.push(key.value().1.to_string());
        }
        drop(index);

        let table = read_txn.open_table(INVOICES_TABLE)?;
        let mut invoices: Vec<InvoiceSnapshot> = Vec::new();
        for id in ids {
            if let Some(value) = table.get(id.as_str())? {
                invoices.push(serde_json::from_slice(value.value())?);
            }
        }
        invoices.sort_by(|a, b| a.invoice_number.cmp(&b.invoice_number));
        Ok(invoices)
    }

    // ========== Idempotency Operations ==========

    fn idempotency_key(operation: &str, command_id: &str) -> String {
        format!("{}:{}", operation, command_id)
    }

    /// Look up a recorded operation result (read-only)
    pub fn get_idempotency(
        &self,
        operation: &str,
        command_id: &str,
    ) -> StorageResult<Option<IdempotencyRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDEMPOTENCY_TABLE)?;
        let key = Self::idempotency_key(operation, command_id);
        match table.get(key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up a recorded operation result (within transaction)
    pub fn get_idempotency_txn(
        &self,
        txn: &WriteTransaction,
        operation: &str,
        command_id: &str,
    ) -> StorageResult<Option<IdempotencyRecord>> {
        let table = txn.open_table(IDEMPOTENCY_TABLE)?;
        let key = Self::idempotency_key(operation, command_id);
        match table.get(key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Record an operation result (within the command transaction)
    pub fn record_idempotency(
        &self,
        txn: &WriteTransaction,
        record: &IdempotencyRecord,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(IDEMPOTENCY_TABLE)?;
        let key = Self::idempotency_key(&record.operation, &record.command_id);
        let value = serde_json::to_vec(record)?;
        table.insert(key.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Purge idempotency records completed before the cutoff.
    /// Returns the number of records removed.
    pub fn purge_idempotency_before(&self, cutoff_millis: i64) -> StorageResult<usize> {
        let txn = self.db.begin_write()?;
        let removed;
        {
            let mut table = txn.open_table(IDEMPOTENCY_TABLE)?;
            let mut expired = Vec::new();
            for result in table.iter()? {
                let (key, value) = result?;
                let record: IdempotencyRecord = serde_json::from_slice(value.value())?;
                if record.completed_at < cutoff_millis {
                    expired.push(key.value().to_string());
                }
            }
            removed = expired.len();
            for key in expired {
                table.remove(key.as_str())?;
            }
        }
        txn.commit()?;
        Ok(removed)
    }

    // ========== Audit Log ==========

    /// Append an audit entry within the command transaction.
    ///
    /// Assigns the next audit sequence number and extends the hash chain.
    #[allow(clippy::too_many_arguments)]
    pub fn append_audit(
        &self,
        txn: &WriteTransaction,
        timestamp: i64,
        action: crate::audit::AuditAction,
        resource_type: String,
        resource_id: String,
        actor_id: Option<String>,
        actor_name: Option<String>,
        previous_state: Option<serde_json::Value>,
        new_state: Option<serde_json::Value>,
    ) -> StorageResult<AuditEntry> {
        let id = {
            let mut seq_table = txn.open_table(SEQUENCE_TABLE)?;
            let current = seq_table.get(AUDIT_SEQ_KEY)?.map(|g| g.value()).unwrap_or(0);
            let next = current + 1;
            seq_table.insert(AUDIT_SEQ_KEY, next)?;
            next
        };

        let prev_hash = {
            let meta = txn.open_table(META_TABLE)?;
            meta.get(AUDIT_HEAD_KEY)?
                .map(|g| g.value().to_string())
                .unwrap_or_else(|| GENESIS_HASH.to_string())
        };

        let mut entry = AuditEntry {
            id,
            timestamp,
            action,
            resource_type,
            resource_id,
            actor_id,
            actor_name,
            previous_state,
            new_state,
            prev_hash,
            curr_hash: String::new(),
        };
        entry.curr_hash = entry_hash(&entry);

        {
            let mut table = txn.open_table(AUDIT_TABLE)?;
            let value = serde_json::to_vec(&entry)?;
            table.insert(entry.id, value.as_slice())?;
        }
        {
            let mut meta = txn.open_table(META_TABLE)?;
            meta.insert(AUDIT_HEAD_KEY, entry.curr_hash.as_str())?;
        }

        Ok(entry)
    }

    /// Query the audit log, oldest first within the selected window
    pub fn query_audit(&self, query: &AuditQuery) -> StorageResult<(Vec<AuditEntry>, u64)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_TABLE)?;

        let mut matched = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let entry: AuditEntry = serde_json::from_slice(value.value())?;
            if let Some(from) = query.from
                && entry.timestamp < from
            {
                continue;
            }
            if let Some(to) = query.to
                && entry.timestamp > to
            {
                continue;
            }
            if let Some(action) = query.action
                && entry.action != action
            {
                continue;
            }
            if let Some(actor_id) = &query.actor_id
                && entry.actor_id.as_deref() != Some(actor_id.as_str())
            {
                continue;
            }
            if let Some(resource_type) = &query.resource_type
                && entry.resource_type != *resource_type
            {
                continue;
            }
            if let Some(resource_id) = &query.resource_id
                && entry.resource_id != *resource_id
            {
                continue;
            }
            matched.push(entry);
        }

        let total = matched.len() as u64;
        let page = matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        Ok((page, total))
    }

    /// Verify the integrity of the full audit chain
    pub fn verify_audit_chain(&self) -> StorageResult<AuditChainVerification> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_TABLE)?;

        let mut total = 0u64;
        let mut breaks = Vec::new();
        let mut expected_prev = GENESIS_HASH.to_string();

        for result in table.iter()? {
            let (_key, value) = result?;
            let entry: AuditEntry = serde_json::from_slice(value.value())?;
            total += 1;

            if entry.prev_hash != expected_prev {
                breaks.push(AuditChainBreak {
                    entry_id: entry.id,
                    expected_hash: expected_prev.clone(),
                    actual_hash: entry.prev_hash.clone(),
                });
            }
            let recomputed = entry_hash(&entry);
            if recomputed != entry.curr_hash {
                breaks.push(AuditChainBreak {
                    entry_id: entry.id,
                    expected_hash: recomputed,
                    actual_hash: entry.curr_hash.clone(),
                });
            }
            expected_prev = entry.curr_hash;
        }

        Ok(AuditChainVerification {
            total_entries: total,
            chain_intact: breaks.is_empty(),
            breaks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditAction;
    use shared::fulfillment::ProductType;
    use shared::util::now_millis;

    fn sample_order(id: &str, number: &str) -> OrderSnapshot {
        let now = now_millis();
        OrderSnapshot {
            order_id: id.to_string(),
            order_number: number.to_string(),
            product_type: ProductType::Broiler,
            quantity_needed: 5000,
            unit_price: 85.0,
            total_budget: 500_000.0,
            delivery_deadline: now + 86_400_000,
            preferred_region: Some("Ashanti".to_string()),
            status: OrderStatus::Draft,
            quantity_assigned: 0,
            quantity_delivered: 0,
            created_by: "officer-1".to_string(),
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn order_roundtrip_and_number_lookup() {
        let store = LedgerStore::open_in_memory().unwrap();
        let order = sample_order("ord-1", "PO-20260101-1001");

        let txn = store.begin_write().unwrap();
        store.put_order(&txn, &order).unwrap();
        txn.commit().unwrap();

        let loaded = store.get_order("ord-1").unwrap().unwrap();
        assert_eq!(loaded, order);

        let by_number = store.get_order_by_number("PO-20260101-1001").unwrap();
        assert_eq!(by_number.unwrap().order_id, "ord-1");
    }

    #[test]
    fn list_orders_filters_by_status_and_region() {
        let store = LedgerStore::open_in_memory().unwrap();
        let mut a = sample_order("ord-1", "PO-20260101-1001");
        a.status = OrderStatus::Published;
        let mut b = sample_order("ord-2", "PO-20260101-1002");
        b.preferred_region = Some("Volta".to_string());

        let txn = store.begin_write().unwrap();
        store.put_order(&txn, &a).unwrap();
        store.put_order(&txn, &b).unwrap();
        txn.commit().unwrap();

        let published = store
            .list_orders(&OrderFilter {
                status: Some(OrderStatus::Published),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].order_id, "ord-1");

        let volta = store
            .list_orders(&OrderFilter {
                region: Some("Volta".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(volta.len(), 1);
        assert_eq!(volta[0].order_id, "ord-2");
    }

    #[test]
    fn order_numbers_increase_within_transaction() {
        let store = LedgerStore::open_in_memory().unwrap();
        let txn = store.begin_write().unwrap();
        let first = store.next_order_number(&txn).unwrap();
        let second = store.next_order_number(&txn).unwrap();
        txn.commit().unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("PO-"));
    }

    #[test]
    fn idempotency_roundtrip_and_purge() {
        let store = LedgerStore::open_in_memory().unwrap();
        let record = IdempotencyRecord {
            operation: "process_payment".to_string(),
            command_id: "cmd-1".to_string(),
            response: CommandResponse::success("cmd-1".to_string()),
            completed_at: 1000,
        };

        let txn = store.begin_write().unwrap();
        store.record_idempotency(&txn, &record).unwrap();
        txn.commit().unwrap();

        let loaded = store.get_idempotency("process_payment", "cmd-1").unwrap();
        assert!(loaded.is_some());
        // Different operation kind does not collide
        assert!(store
            .get_idempotency("approve_invoice", "cmd-1")
            .unwrap()
            .is_none());

        let purged = store.purge_idempotency_before(2000).unwrap();
        assert_eq!(purged, 1);
        assert!(store
            .get_idempotency("process_payment", "cmd-1")
            .unwrap()
            .is_none());
    }

    #[test]
    fn audit_chain_appends_and_verifies() {
        let store = LedgerStore::open_in_memory().unwrap();

        let txn = store.begin_write().unwrap();
        for i in 0..3 {
            store
                .append_audit(
                    &txn,
                    now_millis(),
                    AuditAction::OrderPublished,
                    "order".to_string(),
                    format!("ord-{}", i),
                    Some("officer-1".to_string()),
                    Some("A. Mensah".to_string()),
                    None,
                    None,
                )
                .unwrap();
        }
        txn.commit().unwrap();

        let verification = store.verify_audit_chain().unwrap();
        assert_eq!(verification.total_entries, 3);
        assert!(verification.chain_intact);

        let (entries, total) = store
            .query_audit(&AuditQuery {
                resource_id: Some("ord-1".to_string()),
                limit: 10,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(entries[0].resource_id, "ord-1");
    }

    #[test]
    fn ledger_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.redb");
        {
            let store = LedgerStore::open(&path).unwrap();
            let txn = store.begin_write().unwrap();
            store
                .put_order(&txn, &sample_order("ord-1", "PO-20260101-1001"))
                .unwrap();
            store
                .append_audit(
                    &txn,
                    now_millis(),
                    AuditAction::OrderCreated,
                    "order".to_string(),
                    "ord-1".to_string(),
                    Some("officer-1".to_string()),
                    None,
                    None,
                    None,
                )
                .unwrap();
            txn.commit().unwrap();
        }

        let store = LedgerStore::open(&path).unwrap();
        assert!(store.get_order("ord-1").unwrap().is_some());
        let verification = store.verify_audit_chain().unwrap();
        assert_eq!(verification.total_entries, 1);
        assert!(verification.chain_intact);
    }

    #[test]
    fn assignment_index_scopes_by_order() {
        let store = LedgerStore::open_in_memory().unwrap();
        let now = now_millis();
        let make = |aid: &str, oid: &str, num: &str| AssignmentSnapshot {
            assignment_id: aid.to_string(),
            assignment_number: num.to_string(),
            order_id: oid.to_string(),
            farm_id: "farm-1".to_string(),
            farm_name: "Sunrise Farm".to_string(),
            settlement_account: None,
            quantity_assigned: 100,
            quantity_delivered: 0,
            unit_price: 85.0,
            status: Default::default(),
            readiness_date: None,
            reject_reason: None,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        };

        let txn = store.begin_write().unwrap();
        store.put_assignment(&txn, &make("a1", "ord-1", "PO-1-A1")).unwrap();
        store.put_assignment(&txn, &make("a2", "ord-1", "PO-1-A2")).unwrap();
        store.put_assignment(&txn, &make("a3", "ord-2", "PO-2-A1")).unwrap();
        txn.commit().unwrap();

        let for_one = store.assignments_for_order("ord-1").unwrap();
        assert_eq!(for_one.len(), 2);
        let for_two = store.assignments_for_order("ord-2").unwrap();
        assert_eq!(for_two.len(), 1);
    }
}
