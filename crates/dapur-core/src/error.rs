//! # Error Types
//!
//! Domain-specific error types for dapur-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dapur-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations (client-caused)       │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  dapur-db errors (separate crate)                                      │
//! │  └── DbError          - Storage failures, conflicts                    │
//! │                                                                         │
//! │  server errors (in app)                                                │
//! │  ├── ServiceError     - Core / not found / conflict / internal         │
//! │  └── ApiError         - What clients see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError → Client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is caused by the request itself. None of them is ever
//! retried automatically; the message carries enough detail to correct it.

use thiserror::Error;

use crate::money::Money;
use crate::types::{ItemStatus, OrderStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Product does not resolve in the catalog, or is inactive.
    #[error("Unknown or inactive product: {product_id}")]
    UnknownProduct { product_id: String },

    /// Variant exists but belongs to a different product (or not at all).
    #[error("Variant {variant_id} does not belong to product {product_id}")]
    VariantMismatch {
        product_id: String,
        variant_id: String,
    },

    /// Modifier selection breaks the product's modifier group rules.
    ///
    /// ## When This Occurs
    /// - Modifier id is not in any group attached to the product
    /// - The same modifier is selected twice on one line
    /// - A group gets fewer than `min_select` or more than `max_select` picks
    #[error("Modifier constraint violated for product {product_id}: {reason}")]
    ModifierConstraintViolated { product_id: String, reason: String },

    /// Catering orders need a date and a customer.
    #[error("Catering order is missing required field: {field}")]
    MissingCateringFields { field: String },

    /// Order status edge not in the legal set.
    #[error("Invalid order transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Item kitchen status edge not in the legal set.
    #[error("Invalid item transition from {from} to {to}")]
    InvalidItemTransition { from: ItemStatus, to: ItemStatus },

    /// Items can only change while the order is NEW.
    ///
    /// ## User Workflow
    /// ```text
    /// Kitchen moves order to PREPARING
    ///      │
    ///      ▼
    /// Cashier tries to add "Es Teh"
    ///      │
    ///      ▼
    /// OrderNotEditable { status: PREPARING }
    ///      │
    ///      ▼
    /// UI shows: "Order is already being prepared"
    /// ```
    #[error("Order {order_id} is {status} and cannot be edited")]
    OrderNotEditable { order_id: String, status: OrderStatus },

    /// Order is cancelled or already completed.
    #[error("Order {order_id} is {status} and cannot accept payments")]
    OrderNotPayable { order_id: String, status: OrderStatus },

    /// Payment would push the paid amount past the order total.
    #[error("Payment of {requested} exceeds remaining balance {balance_due}")]
    PaymentExceedsBalance { balance_due: Money, requested: Money },

    /// Cash handed over is less than the amount being paid.
    #[error("Cash received {received} is less than payment amount {amount}")]
    InsufficientCashReceived { amount: Money, received: Money },

    /// Edit would bring the order total below what has already been paid.
    #[error("Order total {total} would fall below amount already paid {paid}")]
    TotalBelowAmountPaid { total: Money, paid: Money },

    /// Item id does not belong to the order.
    #[error("Item {item_id} not found on order {order_id}")]
    ItemNotFound { order_id: String, item_id: String },

    /// Order creation needs at least one line.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// Order has more lines than allowed.
    #[error("Order cannot have more than {max} items")]
    TooManyItems { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid prefix, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value within one request.
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::PaymentExceedsBalance {
            balance_due: Money::from_minor(16_000),
            requested: Money::from_minor(20_000),
        };
        assert_eq!(
            err.to_string(),
            "Payment of 20.000 exceeds remaining balance 16.000"
        );

        let err = CoreError::InvalidTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::New,
        };
        assert_eq!(
            err.to_string(),
            "Invalid order transition from COMPLETED to NEW"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "catering_date".to_string(),
        };
        assert_eq!(err.to_string(), "catering_date is required");

        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 999,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 999");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
