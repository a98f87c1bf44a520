//! Assignment API module
//!
//! Farm-side assignment operations, delivery confirmation and
//! verification.

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

/// Assignment and delivery router
pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/assignments", assignment_routes())
        .nest("/api/deliveries", delivery_routes())
}

fn assignment_routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/accept", post(handler::accept))
        .route("/{id}/reject", post(handler::reject))
        .route("/{id}/prepare", post(handler::start_preparing))
        .route("/{id}/ready", post(handler::mark_ready))
        .route("/{id}/transit", post(handler::start_transit))
        .route("/{id}/cancel", post(handler::cancel))
        .route(
            "/{id}/deliveries",
            post(handler::confirm_delivery).get(handler::deliveries),
        )
        .route("/{id}/invoices", get(handler::invoices))
}

fn delivery_routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}", get(handler::get_delivery))
        .route("/{id}/verify", post(handler::verify_delivery))
}
