//! Unified Error Handling
//!
//! Provides application-wide error types and response structures

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::fulfillment::{CommandError, CommandErrorCode};
use tracing::error;

/// Unified API response structure
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Business Logic Errors ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Illegal state transition: {0}")]
    StateConflict(String),

    #[error("Resource locked: {0}")]
    Locked(String),

    // ========== System Errors ==========
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Application-level Result type used in HTTP handlers
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.as_str()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.as_str()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "E2001", msg.as_str()),
            AppError::StateConflict(msg) => (StatusCode::CONFLICT, "E0005", msg.as_str()),
            AppError::Locked(msg) => (StatusCode::LOCKED, "E0007", msg.as_str()),
            AppError::Storage(msg) => {
                error!(target: "storage", error = %msg, "Storage error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "E9002", "Storage error")
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error",
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message: message.to_string(),
            data: None,
        });

        (status, body).into_response()
    }
}

/// Map a command error to the HTTP-level error taxonomy.
///
/// `ResourceLocked` maps to 423 so retrying clients can distinguish
/// transient contention from terminal failures.
pub fn command_error_status(error: &CommandError) -> StatusCode {
    match error.code {
        CommandErrorCode::InvalidStateTransition => StatusCode::CONFLICT,
        CommandErrorCode::ValidationError
        | CommandErrorCode::FarmNotEligible
        | CommandErrorCode::DuplicateAssignment => StatusCode::BAD_REQUEST,
        CommandErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
        CommandErrorCode::ResourceLocked => StatusCode::LOCKED,
        CommandErrorCode::OrderNotFound
        | CommandErrorCode::AssignmentNotFound
        | CommandErrorCode::DeliveryNotFound
        | CommandErrorCode::InvoiceNotFound => StatusCode::NOT_FOUND,
        CommandErrorCode::PaymentRailFailed => StatusCode::BAD_GATEWAY,
        CommandErrorCode::TransactionFailed
        | CommandErrorCode::StorageFull
        | CommandErrorCode::StorageCorrupted
        | CommandErrorCode::SystemBusy
        | CommandErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}
