//! # dapur-core: Pure Order Logic for Dapur POS
//!
//! This crate is the **heart** of Dapur POS. It contains the order lifecycle,
//! pricing and payment rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dapur POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Cashier / Kitchen front-ends                       │   │
//! │  │     HTTP: create, edit, pay         WebSocket: live events      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/server (services)                       │   │
//! │  └──────────┬──────────────────┬───────────────────────┬──────────┘   │
//! │             │                  │                       │               │
//! │  ┌──────────▼──────────────────▼─────────────┐  ┌──────▼──────────┐   │
//! │  │        ★ dapur-core (THIS CRATE) ★        │  │   dapur-hub     │   │
//! │  │                                           │  │  per-outlet     │   │
//! │  │  money · pricing · catalog · order        │  │  fan-out        │   │
//! │  │  diff · payment · numbering · event       │  └─────────────────┘   │
//! │  │                                           │                         │
//! │  │  NO I/O • NO DATABASE • NO NETWORK        │                         │
//! │  └──────────────────────┬────────────────────┘                         │
//! │                         │                                               │
//! │  ┌──────────────────────▼──────────────────────────────────────────┐   │
//! │  │                 dapur-db (SQLite via sqlx)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Order, OrderItem, Payment, requests
//! - [`money`] - Money in minor units, basis-point rates
//! - [`pricing`] - Discounts and single-rounding totals
//! - [`catalog`] - Catalog snapshot and line pricing
//! - [`order`] - State machines and aggregate mutations
//! - [`diff`] - Bulk cart diff planning
//! - [`payment`] - Payment reconciliation and catering settlement
//! - [`numbering`] - Business day and order number format
//! - [`event`] - Domain events and the publisher seam
//! - [`validation`] - Field-level input checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: time is passed in, never read
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: minor units (i64), rounded once at the order total
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use dapur_core::money::{Money, TaxRate};
//! use dapur_core::pricing::compute_totals;
//!
//! // Nasi Goreng ×2 + Es Teh ×2
//! let subtotal = Money::from_minor(25_000) * 2 + Money::from_minor(8_000) * 2;
//! let totals = compute_totals(subtotal, None, TaxRate::zero());
//! assert_eq!(totals.total_amount.minor(), 66_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod diff;
pub mod error;
pub mod event;
pub mod money;
pub mod numbering;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use event::{DomainEvent, EventPublisher, EventType, OrderEvent};
pub use money::{Money, TaxRate};
pub use pricing::{Discount, DiscountType, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a single order.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches typos (1000 instead of 10). Catering boxes stay well below this.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of free-text notes on orders and items.
pub const MAX_NOTES_LENGTH: usize = 500;

/// Order-number prefix used when an outlet has none configured.
pub const DEFAULT_ORDER_PREFIX: &str = "ORD";
