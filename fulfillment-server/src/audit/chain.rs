//! SHA-256 hash chain over audit entries
//!
//! `curr_hash = sha256(prev_hash || canonical entry fields)`. Recomputing
//! the chain over the stored log detects any in-place modification.

use sha2::{Digest, Sha256};

use super::types::AuditEntry;

/// prev_hash of the first entry in the log
pub const GENESIS_HASH: &str = "0";

/// Compute the hash of an entry (excluding `curr_hash` itself)
pub fn entry_hash(entry: &AuditEntry) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entry.prev_hash.as_bytes());
    hasher.update(entry.id.to_be_bytes());
    hasher.update(entry.timestamp.to_be_bytes());
    hasher.update(entry.action.to_string().as_bytes());
    hasher.update(entry.resource_type.as_bytes());
    hasher.update(entry.resource_id.as_bytes());
    if let Some(actor_id) = &entry.actor_id {
        hasher.update(actor_id.as_bytes());
    }
    if let Some(actor_name) = &entry.actor_name {
        hasher.update(actor_name.as_bytes());
    }
    if let Some(prev) = &entry.previous_state {
        hasher.update(prev.to_string().as_bytes());
    }
    if let Some(new) = &entry.new_state {
        hasher.update(new.to_string().as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::AuditAction;

    fn sample_entry() -> AuditEntry {
        AuditEntry {
            id: 1,
            timestamp: 1_700_000_000_000,
            action: AuditAction::OrderPublished,
            resource_type: "order".to_string(),
            resource_id: "ord-1".to_string(),
            actor_id: Some("officer-1".to_string()),
            actor_name: Some("A. Mensah".to_string()),
            previous_state: Some(serde_json::json!({"status": "DRAFT"})),
            new_state: Some(serde_json::json!({"status": "PUBLISHED"})),
            prev_hash: GENESIS_HASH.to_string(),
            curr_hash: String::new(),
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let entry = sample_entry();
        assert_eq!(entry_hash(&entry), entry_hash(&entry));
    }

    #[test]
    fn hash_changes_when_fields_change() {
        let entry = sample_entry();
        let original = entry_hash(&entry);

        let mut tampered = entry.clone();
        tampered.resource_id = "ord-2".to_string();
        assert_ne!(entry_hash(&tampered), original);

        let mut tampered = entry.clone();
        tampered.new_state = Some(serde_json::json!({"status": "CANCELLED"}));
        assert_ne!(entry_hash(&tampered), original);

        let mut tampered = entry;
        tampered.prev_hash = "deadbeef".to_string();
        assert_ne!(entry_hash(&tampered), original);
    }
}
