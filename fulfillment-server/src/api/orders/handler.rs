//! Order API handlers

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::command_reply;
use crate::common::{ok, AppError, AppResult};
use crate::core::ServerState;
use crate::fulfillment::storage::OrderFilter;
use shared::farm::RecommendationOutcome;
use shared::fulfillment::{
    AssignmentSnapshot, CommandPayload, FulfillmentCommand, OrderSnapshot, OrderStatus,
    ProductType,
};
use shared::Actor;

/// Build a command, honoring a caller-supplied idempotency key
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

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub actor: Actor,
    pub command_id: Option<String>,
    pub product_type: ProductType,
    #[validate(range(min = 1))]
    pub quantity_needed: u32,
    #[validate(range(min = 0.01))]
    pub unit_price: f64,
    #[validate(range(min = 0.01))]
    pub total_budget: f64,
    pub delivery_deadline: i64,
    pub preferred_region: Option<String>,
}

/// Create a draft purchase order
pub async fn create(
    State(state): State<ServerState>,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::CreateOrder {
            product_type: req.product_type,
            quantity_needed: req.quantity_needed,
            unit_price: req.unit_price,
            total_budget: req.total_budget,
            delivery_deadline: req.delivery_deadline,
            preferred_region: req.preferred_region,
        },
    );
    Ok(command_reply(state.manager.execute(cmd).await))
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor: Actor,
    pub command_id: Option<String>,
}

/// Publish a draft order
pub async fn publish(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::PublishOrder { order_id: id },
    );
    command_reply(state.manager.execute(cmd).await)
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub actor: Actor,
    pub command_id: Option<String>,
    pub reason: Option<String>,
}

/// Cancel an order
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::CancelOrder {
            order_id: id,
            reason: req.reason,
        },
    );
    command_reply(state.manager.execute(cmd).await)
}

#[derive(Debug, Deserialize)]
pub struct AutoAssignRequest {
    pub actor: Actor,
    pub command_id: Option<String>,
    pub max_farms: Option<usize>,
}

/// Auto-assign farms from the recommendation engine
pub async fn auto_assign(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<AutoAssignRequest>,
) -> impl IntoResponse {
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::AutoAssign {
            order_id: id,
            max_farms: req.max_farms,
        },
    );
    command_reply(state.manager.execute(cmd).await)
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignFarmRequest {
    pub actor: Actor,
    pub command_id: Option<String>,
    pub farm_id: String,
    #[validate(range(min = 1))]
    pub quantity: u32,
    pub unit_price: Option<f64>,
}

/// Manually assign one farm
pub async fn assign_farm(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<AssignFarmRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let cmd = command(
        req.command_id,
        req.actor,
        CommandPayload::AssignFarm {
            order_id: id,
            farm_id: req.farm_id,
            quantity: req.quantity,
            unit_price: req.unit_price,
        },
    );
    Ok(command_reply(state.manager.execute(cmd).await))
}

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    pub region: Option<String>,
    pub created_by: Option<String>,
}

/// List orders by status/region/officer
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<crate::common::AppResponse<Vec<OrderSnapshot>>>> {
    let orders = state
        .manager
        .list_orders(&OrderFilter {
            status: query.status,
            region: query.region,
            created_by: query.created_by,
        })
        .map_err(|e| AppError::Storage(e.to_string()))?;
    Ok(ok(orders))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<crate::common::AppResponse<OrderSnapshot>>> {
    let order = state
        .manager
        .get_order(&id)
        .map_err(|e| AppError::Storage(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;
    Ok(ok(order))
}

/// Get order by order number
pub async fn get_by_number(
    State(state): State<ServerState>,
    Path(number): Path<String>,
) -> AppResult<Json<crate::common::AppResponse<OrderSnapshot>>> {
    let order = state
        .manager
        .get_order_by_number(&number)
        .map_err(|e| AppError::Storage(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", number)))?;
    Ok(ok(order))
}

/// List assignments of an order
pub async fn assignments(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<crate::common::AppResponse<Vec<AssignmentSnapshot>>>> {
    let assignments = state
        .manager
        .assignments_for_order(&id)
        .map_err(|e| AppError::Storage(e.to_string()))?;
    Ok(ok(assignments))
}

/// Advisory recommendation list for an order
pub async fn recommendations(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<crate::common::AppResponse<RecommendationOutcome>>> {
    let outcome = state
        .manager
        .recommend_for_order(&id)
        .await
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    Ok(ok(outcome))
}
