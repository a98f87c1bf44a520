//! Fulfillment domain types
//!
//! This module provides the types of the order fulfillment engine:
//! - Commands: requests from officers and farm operators to mutate state
//! - Events: immutable facts recorded after command processing
//! - Snapshots: current state of each aggregate
//! - Types: status enums, inputs, and the command response envelope

pub mod command;
pub mod event;
pub mod snapshot;
pub mod types;

// Re-exports
pub use command::{CommandPayload, FulfillmentCommand};
pub use event::{EventPayload, FulfillmentEvent, FulfillmentEventType};
pub use snapshot::{
    AssignmentSnapshot, DeliveryConfirmation, InvoiceSnapshot, OrderSnapshot,
};
pub use types::*;
