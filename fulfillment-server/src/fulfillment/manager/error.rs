use shared::fulfillment::{CommandError, CommandErrorCode};
use thiserror::Error;

use crate::fulfillment::locks::LockError;
use crate::fulfillment::storage::StorageError;
use crate::fulfillment::traits::FulfillmentError;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Resource locked: {0}")]
    ResourceLocked(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Fulfillment(FulfillmentError),
}

impl From<FulfillmentError> for ManagerError {
    fn from(err: FulfillmentError) -> Self {
        match err {
            FulfillmentError::Storage(e) => ManagerError::Storage(e),
            FulfillmentError::PermissionDenied(msg) => ManagerError::PermissionDenied(msg),
            other => ManagerError::Fulfillment(other),
        }
    }
}

impl From<LockError> for ManagerError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Timeout(key) => ManagerError::ResourceLocked(key),
        }
    }
}

/// Classify a storage failure into a wire-level error code
fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    if matches!(e, StorageError::Serialization(_)) {
        return CommandErrorCode::InternalError;
    }

    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return CommandErrorCode::StorageFull;
    }
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }
    if matches!(e, StorageError::Commit(_)) {
        // Atomic commit failed; nothing was applied and a retry is safe
        return CommandErrorCode::TransactionFailed;
    }

    CommandErrorCode::SystemBusy
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let (code, message) = match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                (code, e.to_string())
            }
            ManagerError::ResourceLocked(key) => (
                CommandErrorCode::ResourceLocked,
                format!("Resource {} is locked by another operation; retry with backoff", key),
            ),
            ManagerError::PermissionDenied(msg) => (CommandErrorCode::PermissionDenied, msg),
            ManagerError::Fulfillment(err) => {
                let code = match &err {
                    FulfillmentError::InvalidStateTransition { .. } => {
                        CommandErrorCode::InvalidStateTransition
                    }
                    FulfillmentError::Validation(_) => CommandErrorCode::ValidationError,
                    FulfillmentError::PermissionDenied(_) => CommandErrorCode::PermissionDenied,
                    FulfillmentError::OrderNotFound(_) => CommandErrorCode::OrderNotFound,
                    FulfillmentError::AssignmentNotFound(_) => {
                        CommandErrorCode::AssignmentNotFound
                    }
                    FulfillmentError::DeliveryNotFound(_) => CommandErrorCode::DeliveryNotFound,
                    FulfillmentError::InvoiceNotFound(_) => CommandErrorCode::InvoiceNotFound,
                    FulfillmentError::FarmNotEligible { .. } => CommandErrorCode::FarmNotEligible,
                    FulfillmentError::DuplicateAssignment { .. } => {
                        CommandErrorCode::DuplicateAssignment
                    }
                    FulfillmentError::PaymentRail(_) => CommandErrorCode::PaymentRailFailed,
                    FulfillmentError::Storage(_) => CommandErrorCode::InternalError,
                };
                (code, err.to_string())
            }
        };
        CommandError::new(code, message)
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
