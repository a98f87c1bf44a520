//! Order API module
//!
//! Order lifecycle commands, assignment commands scoped to an order, and
//! the order-side query surface.

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/number/{number}", get(handler::get_by_number))
        .route("/{id}/publish", post(handler::publish))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/auto-assign", post(handler::auto_assign))
        .route("/{id}/assignments", post(handler::assign_farm).get(handler::assignments))
        .route("/{id}/recommendations", get(handler::recommendations))
}
