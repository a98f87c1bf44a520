//! API route modules
//!
//! # Structure
//!
//! - [`health`] - liveness check
//! - [`orders`] - order lifecycle, assignment, recommendations
//! - [`assignments`] - farm-side assignment operations and deliveries
//! - [`invoices`] - invoice review and payment
//! - [`audit_log`] - audit trail queries and chain verification

pub mod assignments;
pub mod audit_log;
pub mod health;
pub mod invoices;
pub mod orders;

use axum::{http::StatusCode, response::IntoResponse, Json, Router};
use shared::fulfillment::CommandResponse;
use tower_http::trace::TraceLayer;

use crate::common::error::command_error_status;
use crate::core::ServerState;

/// Wrap a command response with the HTTP status its error maps to
/// (423 for lock contention, 409 for illegal transitions, ...)
pub(crate) fn command_reply(response: CommandResponse) -> impl IntoResponse {
    let status = response
        .error
        .as_ref()
        .map(command_error_status)
        .unwrap_or(StatusCode::OK);
    (status, Json(response))
}

/// Compose the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(assignments::router())
        .merge(invoices::router())
        .merge(audit_log::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
