//! # Validation Module
//!
//! Field-level input checks that run before any catalog lookup or
//! database access.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (serde)                                       │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── quantities, lengths, required catering fields                     │
//! │  └── catalog rules live in `catalog` (need a snapshot)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (outlet_id, order_number)                                  │
//! │  └── Foreign keys order → items → modifiers, payments → order          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dapur_core::validation::{validate_quantity, validate_order_prefix};
//!
//! assert!(validate_quantity(2).is_ok());
//! assert!(validate_quantity(0).is_err());
//! assert_eq!(validate_order_prefix(" kwr ").unwrap(), "KWR");
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{CreateOrderRequest, OrderLineRequest, OrderType, PaymentRequest};
use crate::{MAX_ITEM_QUANTITY, MAX_NOTES_LENGTH, MAX_ORDER_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Quantity must be 1..=MAX_ITEM_QUANTITY. Zero is never an implicit delete.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

pub fn validate_notes(notes: &str) -> ValidationResult<()> {
    if notes.chars().count() > MAX_NOTES_LENGTH {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
        });
    }
    Ok(())
}

fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    if let Some(value) = value {
        if value.chars().count() > max {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max,
            });
        }
    }
    Ok(())
}

/// Normalizes an order-number prefix.
///
/// ## Rules
/// - 1 to 8 characters after trimming
/// - ASCII letters and digits only
/// - Returned uppercased
pub fn validate_order_prefix(prefix: &str) -> ValidationResult<String> {
    let prefix = prefix.trim();

    if prefix.is_empty() {
        return Err(ValidationError::Required {
            field: "order_prefix".to_string(),
        });
    }
    if prefix.len() > 8 {
        return Err(ValidationError::TooLong {
            field: "order_prefix".to_string(),
            max: 8,
        });
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "order_prefix".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }
    Ok(prefix.to_ascii_uppercase())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Field checks for one cart line.
pub fn validate_line(line: &OrderLineRequest) -> ValidationResult<()> {
    if line.product_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }
    validate_quantity(line.quantity)?;
    if let Some(notes) = &line.notes {
        validate_notes(notes)?;
    }
    Ok(())
}

/// Field checks for a whole creation request, plus catering requirements.
///
/// Catalog rules are checked afterwards against a resolved snapshot.
pub fn validate_create_request(request: &CreateOrderRequest) -> CoreResult<()> {
    if request.items.is_empty() {
        return Err(CoreError::EmptyOrder);
    }
    if request.items.len() > MAX_ORDER_ITEMS {
        return Err(CoreError::TooManyItems {
            max: MAX_ORDER_ITEMS,
        });
    }
    for line in &request.items {
        validate_line(line)?;
    }

    validate_optional_text("table_number", request.table_number.as_deref(), 20)?;
    validate_optional_text("customer_name", request.customer_name.as_deref(), 200)?;
    validate_optional_text("notes", request.notes.as_deref(), MAX_NOTES_LENGTH)?;

    if let Some(discount) = &request.discount {
        discount.validate()?;
    }
    Ok(())
}

/// Catering orders need a date and a customer.
pub fn validate_catering_fields(request: &CreateOrderRequest) -> CoreResult<()> {
    if request.order_type != OrderType::Catering {
        return Ok(());
    }
    if request.catering_date.is_none() {
        return Err(CoreError::MissingCateringFields {
            field: "catering_date".to_string(),
        });
    }
    let has_customer = request
        .customer_id
        .as_deref()
        .map(|c| !c.trim().is_empty())
        .unwrap_or(false);
    if !has_customer {
        return Err(CoreError::MissingCateringFields {
            field: "customer_id".to_string(),
        });
    }
    Ok(())
}

/// Field checks for a payment submission. Balance rules live in `payment`.
pub fn validate_payment_request(request: &PaymentRequest) -> ValidationResult<()> {
    if !request.amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    validate_optional_text("reference_number", request.reference_number.as_deref(), 100)
}

// =============================================================================
// Unit Tests
// =============================================================================
