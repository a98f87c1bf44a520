//! Invoice API handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::api::command_reply;
use crate::common::{ok, AppError, AppResult};
use crate::core::ServerState;
use shared::fulfillment::{CommandPayload, FulfillmentCommand, InvoiceSnapshot};
use shared::Actor;

fn command(
    command_id: Option<String>,
    actor: Actor,
    payload: CommandPayload,
) -> FulfillmentCommand {
    match command_id {
        Some(id) => FulfillmentCommand::with_command_id(id, actor, payload),
        None => FulfillmentCommand::new(actor, payload),
    }
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor: Actor,
    pub command_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub actor: Actor,
    pub command_id: Option<String>,
    pub reason: String,
}

/// Approve a pending or disputed invoice
pub async fn approve(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::ApproveInvoice { invoice_id: id },
    );
    command_reply(state.manager.execute(cmd).await)
}

/// Reject an invoice
pub async fn reject(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::RejectInvoice {
            invoice_id: id,
            reason: req.reason,
        },
    );
    command_reply(state.manager.execute(cmd).await)
}

/// Dispute an invoice
pub async fn dispute(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::DisputeInvoice {
            invoice_id: id,
            reason: req.reason,
        },
    );
    command_reply(state.manager.execute(cmd).await)
}

/// Settle an approved invoice through the payment rail
pub async fn pay(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::ProcessPayment { invoice_id: id },
    );
    command_reply(state.manager.execute(cmd).await)
}

/// Get invoice by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<crate::common::AppResponse<InvoiceSnapshot>>> {
    let invoice = state
        .manager
        .get_invoice(&id)
        .map_err(|e| AppError::Storage(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", id)))?;
    Ok(ok(invoice))
}
