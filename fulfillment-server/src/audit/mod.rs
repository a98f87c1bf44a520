//! Append-only audit log
//!
//! Every mutating operation appends at least one entry inside the same
//! ledger transaction that commits the state change. Entries are
//! immutable, never deleted, and SHA-256 hash-chained so tampering is
//! detectable after the fact.

pub mod chain;
pub mod types;

pub use chain::{entry_hash, GENESIS_HASH};
pub use types::{
    AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, AuditQuery,
};
