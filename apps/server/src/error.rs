//! # Service and API Errors
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Dapur Server                           │
//! │                                                                         │
//! │  CoreError ─────────┐                                                   │
//! │  (client-caused)    │                                                   │
//! │                     ▼                                                   │
//! │  DbError ──────► ServiceError ──────► ApiError ──────► HTTP response   │
//! │   │ NotFound     ├─ Domain            { code, message }                 │
//! │   │ is_conflict  ├─ NotFound                                            │
//! │   │ other ───────┼─ Conflict   (retried once, then 409)                 │
//! │   │  (logged)    └─ Storage    (opaque 500)                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Clients receive a machine-readable `code` plus a human-readable `message`:
//! ```json
//! {
//!   "code": "PAYMENT_EXCEEDS_BALANCE",
//!   "message": "Payment of 20.000 exceeds remaining balance 16.000"
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use dapur_core::{CoreError, ValidationError};
use dapur_db::DbError;

// =============================================================================
// Service Error
// =============================================================================

/// Failure of one service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule violated by the request.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Order or outlet does not exist in the caller's outlet.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Lost a race with a concurrent writer.
    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    /// Storage failure. Details are logged, never returned to clients.
    #[error("Storage failure: {0}")]
    Storage(DbError),
}

impl ServiceError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Conflict(_))
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Domain(err.into())
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            err if err.is_conflict() => ServiceError::Conflict(err.to_string()),
            err => {
                tracing::error!(error = %err, "Storage operation failed");
                ServiceError::Storage(err)
            }
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// API Error
// =============================================================================

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Scope headers missing (400)
    MissingScope,

    /// Catalog rules (422)
    UnknownProduct,
    VariantMismatch,
    ModifierConstraintViolated,
    MissingCateringFields,

    /// State machine rules (409)
    InvalidTransition,
    OrderNotEditable,
    OrderNotPayable,

    /// Money rules (422)
    PaymentExceedsBalance,
    InsufficientCashReceived,
    TotalBelowAmountPaid,

    /// Concurrent writer won; retry the request (409)
    Conflict,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn missing_scope(header: &str) -> Self {
        ApiError::new(
            ErrorCode::MissingScope,
            format!("Missing or empty {} header", header),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn status(&self) -> StatusCode {
        match self.code {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::MissingScope => StatusCode::BAD_REQUEST,
            ErrorCode::UnknownProduct
            | ErrorCode::VariantMismatch
            | ErrorCode::ModifierConstraintViolated
            | ErrorCode::MissingCateringFields
            | ErrorCode::PaymentExceedsBalance
            | ErrorCode::InsufficientCashReceived
            | ErrorCode::TotalBelowAmountPaid => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InvalidTransition
            | ErrorCode::OrderNotEditable
            | ErrorCode::OrderNotPayable
            | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::UnknownProduct { .. } => ErrorCode::UnknownProduct,
            CoreError::VariantMismatch { .. } => ErrorCode::VariantMismatch,
            CoreError::ModifierConstraintViolated { .. } => ErrorCode::ModifierConstraintViolated,
            CoreError::MissingCateringFields { .. } => ErrorCode::MissingCateringFields,
            CoreError::InvalidTransition { .. } | CoreError::InvalidItemTransition { .. } => {
                ErrorCode::InvalidTransition
            }
            CoreError::OrderNotEditable { .. } => ErrorCode::OrderNotEditable,
            CoreError::OrderNotPayable { .. } => ErrorCode::OrderNotPayable,
            CoreError::PaymentExceedsBalance { .. } => ErrorCode::PaymentExceedsBalance,
            CoreError::InsufficientCashReceived { .. } => ErrorCode::InsufficientCashReceived,
            CoreError::TotalBelowAmountPaid { .. } => ErrorCode::TotalBelowAmountPaid,
            CoreError::ItemNotFound { .. } => ErrorCode::NotFound,
            CoreError::EmptyOrder | CoreError::TooManyItems { .. } | CoreError::Validation(_) => {
                ErrorCode::ValidationError
            }
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::NotFound { entity, id } => {
                ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
            }
            ServiceError::Conflict(_) => ApiError::new(
                ErrorCode::Conflict,
                "The order was modified concurrently, please retry",
            ),
            // already logged on conversion from DbError
            ServiceError::Storage(_) => ApiError::new(ErrorCode::Internal, "Internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dapur_core::{Money, OrderStatus};

    #[test]
    fn test_db_errors_are_classified() {
        let err: ServiceError = DbError::not_found("Order", "o-1").into();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let err: ServiceError = DbError::Busy("database is locked".into()).into();
        assert!(err.is_conflict());

        let err: ServiceError = DbError::QueryFailed("syntax error".into()).into();
        assert!(matches!(err, ServiceError::Storage(_)));
    }

    #[test]
    fn test_storage_errors_are_opaque() {
        let api = ApiError::from(ServiceError::Storage(DbError::Internal(
            "disk I/O error at page 42".into(),
        )));
        assert_eq!(api.code, ErrorCode::Internal);
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("page 42"));
    }

    #[test]
    fn test_domain_error_status_codes() {
        let api = ApiError::from(CoreError::PaymentExceedsBalance {
            balance_due: Money::from_minor(16_000),
            requested: Money::from_minor(20_000),
        });
        assert_eq!(api.code, ErrorCode::PaymentExceedsBalance);
        assert_eq!(api.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let api = ApiError::from(CoreError::OrderNotEditable {
            order_id: "o-1".into(),
            status: OrderStatus::Preparing,
        });
        assert_eq!(api.status(), StatusCode::CONFLICT);

        let api = ApiError::from(CoreError::EmptyOrder);
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_body_shape() {
        let api = ApiError::new(ErrorCode::OrderNotPayable, "Order is CANCELLED");
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "ORDER_NOT_PAYABLE");
        assert_eq!(json["message"], "Order is CANCELLED");
    }
}
