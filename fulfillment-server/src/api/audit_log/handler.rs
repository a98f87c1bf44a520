//! Audit log API handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use crate::audit::{AuditChainVerification, AuditEntry, AuditQuery};
use crate::common::{ok, AppError, AppResult};
use crate::core::ServerState;

/// Audit list response
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntry>,
    pub total: u64,
}

/// Query the audit trail by aggregate, actor or time window
pub async fn query(
    State(state): State<ServerState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<crate::common::AppResponse<AuditListResponse>>> {
    let (items, total) = state
        .manager
        .audit_trail(&query)
        .map_err(|e| AppError::Storage(e.to_string()))?;
    Ok(ok(AuditListResponse { items, total }))
}

/// Verify the audit hash chain end to end
pub async fn verify_chain(
    State(state): State<ServerState>,
) -> AppResult<Json<crate::common::AppResponse<AuditChainVerification>>> {
    let verification = state
        .manager
        .verify_audit_chain()
        .map_err(|e| AppError::Storage(e.to_string()))?;
    Ok(ok(verification))
}
