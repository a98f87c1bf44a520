//! Assignment and delivery API handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::command_reply;
use crate::common::{ok, AppError, AppResult};
use crate::core::ServerState;
use shared::fulfillment::{
    AssignmentSnapshot, CommandPayload, DeliveryConfirmation, DeliveryInput, FulfillmentCommand,
    InvoiceSnapshot, VerificationInput,
};
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
pub struct ReasonRequest {
    pub actor: Actor,
    pub command_id: Option<String>,
    pub reason: Option<String>,
}

/// Farm accepts its assignment
pub async fn accept(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::AcceptAssignment { assignment_id: id },
    );
    command_reply(state.manager.execute(cmd).await)
}

/// Farm declines a pending assignment
pub async fn reject(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ReasonRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::RejectAssignment {
            assignment_id: id,
            reason: req.reason,
        },
    );
    command_reply(state.manager.execute(cmd).await)
}

#[derive(Debug, Deserialize)]
pub struct StartPreparingRequest {
    pub actor: Actor,
    pub command_id: Option<String>,
    /// Farm-committed readiness date (Unix milliseconds)
    pub readiness_date: i64,
}

/// Farm starts preparation, committing a readiness date
pub async fn start_preparing(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<StartPreparingRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::StartPreparing {
            assignment_id: id,
            readiness_date: req.readiness_date,
        },
    );
    command_reply(state.manager.execute(cmd).await)
}

/// Farm reports the flock ready for pickup
pub async fn mark_ready(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::MarkReady { assignment_id: id },
    );
    command_reply(state.manager.execute(cmd).await)
}

/// Farm reports goods in transit
pub async fn start_transit(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::StartTransit { assignment_id: id },
    );
    command_reply(state.manager.execute(cmd).await)
}

/// Officer cancels an assignment before delivery
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ReasonRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::CancelAssignment {
            assignment_id: id,
            reason: req.reason,
        },
    );
    command_reply(state.manager.execute(cmd).await)
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmDeliveryRequest {
    pub actor: Actor,
    pub command_id: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: u32,
    pub average_unit_weight_kg: Option<f64>,
    #[serde(default)]
    pub loss_count: u32,
    pub note: Option<String>,
}

/// Record one physical delivery against an assignment
pub async fn confirm_delivery(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ConfirmDeliveryRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::ConfirmDelivery {
            assignment_id: id,
            delivery: DeliveryInput {
                quantity: req.quantity,
                average_unit_weight_kg: req.average_unit_weight_kg,
                loss_count: req.loss_count,
                note: req.note,
            },
        },
    );
    Ok(command_reply(state.manager.execute(cmd).await))
}

#[derive(Debug, Deserialize)]
pub struct VerifyDeliveryRequest {
    pub actor: Actor,
    pub command_id: Option<String>,
    pub quality_passed: bool,
    pub note: Option<String>,
}

/// Officer verifies a delivery; raises the settlement invoice
pub async fn verify_delivery(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<VerifyDeliveryRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::VerifyDelivery {
            delivery_id: id,
            verification: VerificationInput {
                quality_passed: req.quality_passed,
                note: req.note,
            },
        },
    );
    command_reply(state.manager.execute(cmd).await)
}

/// Get assignment by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<crate::common::AppResponse<AssignmentSnapshot>>> {
    let assignment = state
        .manager
        .get_assignment(&id)
        .map_err(|e| AppError::Storage(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))?;
    Ok(ok(assignment))
}

/// List deliveries of an assignment
pub async fn deliveries(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<crate::common::AppResponse<Vec<DeliveryConfirmation>>>> {
    let deliveries = state
        .manager
        .deliveries_for_assignment(&id)
        .map_err(|e| AppError::Storage(e.to_string()))?;
    Ok(ok(deliveries))
}

/// List invoices of an assignment
pub async fn invoices(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<crate::common::AppResponse<Vec<InvoiceSnapshot>>>> {
    let invoices = state
        .manager
        .invoices_for_assignment(&id)
        .map_err(|e| AppError::Storage(e.to_string()))?;
    Ok(ok(invoices))
}

/// Get delivery by id
pub async fn get_delivery(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<crate::common::AppResponse<DeliveryConfirmation>>> {
    let delivery = state
        .manager
        .get_delivery(&id)
        .map_err(|e| AppError::Storage(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Delivery {} not found", id)))?;
    Ok(ok(delivery))
}
