//! Shared types for the procurement fulfillment platform
//!
//! Common vocabulary used by the fulfillment server and its clients:
//! actor identity, farm directory types, command/event envelopes,
//! aggregate snapshots, and response structures.

pub mod actor;
pub mod farm;
pub mod fulfillment;
pub mod util;

// Re-exports
pub use actor::{Actor, ActorRole};
pub use serde::{Deserialize, Serialize};
