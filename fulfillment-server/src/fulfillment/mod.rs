//! Order fulfillment core
//!
//! Implements the fulfillment engine around a command → events →
//! snapshots pipeline:
//!
//! - **manager**: orchestrator (lock, idempotency check, permission
//!   check, command execution, atomic persist, notification)
//! - **actions**: one command handler per operation (validation + events)
//! - **appliers**: pure event → snapshot mutators
//! - **transitions**: authoritative state machine tables
//! - **storage**: redb-backed ledger (aggregates, audit log, idempotency)
//! - **locks**: per-aggregate lease manager
//! - **money**: decimal arithmetic and invoice deduction rules
//!
//! # Command Flow
//!
//! ```text
//! execute(cmd)
//!     ├─ 1. Acquire aggregate lease (order:{id} / invoice:{id})
//!     ├─ 2. Idempotency check (operation kind + command_id)
//!     ├─ 3. Begin write transaction (re-check idempotency)
//!     ├─ 4. Permission check via access policy
//!     ├─ 5. Action validates state transition and emits events
//!     ├─ 6. Appliers update snapshots
//!     ├─ 7. Persist snapshots + audit entries + idempotency record
//!     ├─ 8. Commit transaction, release lease
//!     └─ 9. Broadcast events, best-effort notify
//! ```

pub mod actions;
pub mod locks;
pub mod manager;
pub mod money;
pub mod storage;
pub mod traits;
pub mod transitions;
pub mod appliers;

// Re-exports
pub use locks::{LockError, LockGuard, LockManager};
pub use manager::FulfillmentManager;
pub use storage::{IdempotencyRecord, LedgerStore, OrderFilter, StorageError};
pub use traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier, FulfillmentError};
