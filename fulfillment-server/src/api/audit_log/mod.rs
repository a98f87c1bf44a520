//! Audit log API module

mod handler;

use axum::{routing::get, Router};

use crate::core::ServerState;

/// Audit log router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/audit", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::query))
        .route("/verify", get(handler::verify_chain))
}
