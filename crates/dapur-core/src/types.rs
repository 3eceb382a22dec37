//! # Domain Types
//!
//! Core domain types used throughout Dapur POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderItem     │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  id (UUID)      │   │  id (UUID)      │       │
//! │  │  order_number   │   │  unit_price  ❄  │   │  order_id (FK)  │       │
//! │  │  status         │   │  quantity       │   │  method         │       │
//! │  │  catering_status│   │  status         │   │  amount         │       │
//! │  │  total_amount   │   │  modifiers ──┐  │   │  change_amount  │       │
//! │  └─────────────────┘   └──────────────┼──┘   └─────────────────┘       │
//! │                                       ▼                                 │
//! │                          ┌──────────────────────┐                       │
//! │                          │  OrderItemModifier   │   ❄ = frozen price    │
//! │                          │  unit_price  ❄       │       snapshot        │
//! │                          └──────────────────────┘                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every order has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `order_number`: human-readable, unique per outlet (`KWR-261018-001`)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};
use crate::pricing::{Discount, DiscountType};

// =============================================================================
// Order Type
// =============================================================================

/// How the order is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
    /// Booked ahead with a deposit; carries the catering sub-state.
    Catering,
}

impl OrderType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderType::DineIn => "DINE_IN",
            OrderType::Takeaway => "TAKEAWAY",
            OrderType::Delivery => "DELIVERY",
            OrderType::Catering => "CATERING",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status of an order.
///
/// ```text
///   NEW ──► PREPARING ──► READY ──► COMPLETED
///    │          │
///    └──────────┴──► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::New,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// COMPLETED and CANCELLED freeze the order.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::New
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ValidationError;

    /// Case-insensitive, e.g. `"preparing"` or `"PREPARING"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown order status '{}'", wanted),
            })
    }
}

// =============================================================================
// Item Status
// =============================================================================

/// Kitchen preparation status of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pending,
    Preparing,
    Ready,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 3] = [ItemStatus::Pending, ItemStatus::Preparing, ItemStatus::Ready];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "PENDING",
            ItemStatus::Preparing => "PREPARING",
            ItemStatus::Ready => "READY",
        }
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Pending
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Catering Status
// =============================================================================

/// Catering sub-state, orthogonal to [`OrderStatus`].
///
/// ```text
///   BOOKED ──► DP_PAID ──► SETTLED
///     │  └───────────────────▲        (full first payment skips DP_PAID)
///     └──────────┴──► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CateringStatus {
    Booked,
    DpPaid,
    Settled,
    Cancelled,
}

impl CateringStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CateringStatus::Booked => "BOOKED",
            CateringStatus::DpPaid => "DP_PAID",
            CateringStatus::Settled => "SETTLED",
            CateringStatus::Cancelled => "CANCELLED",
        }
    }

    #[inline]
    pub const fn is_closed(&self) -> bool {
        matches!(self, CateringStatus::Settled | CateringStatus::Cancelled)
    }
}

impl fmt::Display for CateringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method & Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Physical cash; change is computed from `amount_received`.
    Cash,
    /// QR code payment (synchronous confirmation).
    Qris,
    /// Bank transfer.
    Transfer,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Qris => "QRIS",
            PaymentMethod::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// Order header: one purchase transaction.
///
/// All monetary fields are derived and stored. They are recomputed only by
/// [`OrderDetail::recalculate`](crate::order), never at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub outlet_id: String,
    /// Human-readable number, unique per outlet.
    pub order_number: String,
    /// Position within the outlet's business day (1-based).
    pub order_seq: i64,
    #[ts(as = "String")]
    pub business_date: NaiveDate,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub table_number: Option<String>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,

    pub subtotal: Money,
    pub discount_type: Option<DiscountType>,
    /// Basis points for PERCENTAGE, minor units for FIXED_AMOUNT.
    pub discount_value: i64,
    pub discount_amount: Money,
    /// Outlet tax rate copied at creation.
    pub tax_rate: TaxRate,
    pub tax_amount: Money,
    pub total_amount: Money,
    /// Σ COMPLETED payments. Only ever grows.
    pub amount_paid: Money,

    #[ts(as = "Option<String>")]
    pub catering_date: Option<NaiveDate>,
    pub catering_status: Option<CateringStatus>,
    pub catering_dp_amount: Option<Money>,

    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Discount configuration stored on the order, if any.
    pub fn discount(&self) -> Option<Discount> {
        self.discount_type
            .map(|kind| Discount::new(kind, self.discount_value))
    }

    #[inline]
    pub fn is_catering(&self) -> bool {
        self.order_type == OrderType::Catering
    }

    /// Remaining amount before the order is fully paid.
    #[inline]
    pub fn balance_due(&self) -> Money {
        (self.total_amount - self.amount_paid).non_negative()
    }

    /// NEW/PREPARING/READY, or a catering booking not yet settled.
    pub fn is_active(&self) -> bool {
        if !self.status.is_terminal() {
            return true;
        }
        self.is_catering()
            && self
                .catering_status
                .map(|s| !s.is_closed())
                .unwrap_or(false)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line in an order.
/// Uses snapshot pattern to freeze catalog data at the time it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Product name at time of ordering (frozen).
    pub product_name: String,
    /// Variant name at time of ordering (frozen).
    pub variant_name: Option<String>,
    /// Kitchen station copied from the product.
    pub station: Option<String>,
    pub quantity: i64,
    /// Base or variant price at time of ordering (frozen).
    pub unit_price: Money,
    /// (unit_price + Σ modifier prices) × quantity.
    pub subtotal: Money,
    pub notes: Option<String>,
    pub status: ItemStatus,
    pub modifiers: Vec<OrderItemModifier>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    /// Sum of modifier prices for one unit.
    pub fn modifiers_unit_total(&self) -> Money {
        self.modifiers.iter().map(|m| m.unit_price).sum()
    }

    /// Recomputes `subtotal` from the frozen prices and current quantity.
    pub fn recompute_subtotal(&mut self) {
        self.subtotal = (self.unit_price + self.modifiers_unit_total()) * self.quantity;
    }
}

/// A selected modifier on an item, with its own frozen price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItemModifier {
    pub id: String,
    pub order_item_id: String,
    pub modifier_id: String,
    pub modifier_group_id: String,
    /// Modifier name at time of ordering (frozen).
    pub name: String,
    pub unit_price: Money,
}

// =============================================================================
// Payment
// =============================================================================

/// One payment event against an order. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub payment_method: PaymentMethod,
    pub amount: Money,
    pub status: PaymentStatus,
    pub reference_number: Option<String>,
    /// For cash: amount the customer handed over.
    pub amount_received: Option<Money>,
    /// For cash: change returned to the customer.
    pub change_amount: Option<Money>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Detail (aggregate view)
// =============================================================================

/// An order with its items and payments: the unit every service loads,
/// mutates and publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
}

impl OrderDetail {
    #[inline]
    pub fn id(&self) -> &str {
        &self.order.id
    }

    #[inline]
    pub fn outlet_id(&self) -> &str {
        &self.order.outlet_id
    }

    pub fn item(&self, item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }
}

// =============================================================================
// Requests
// =============================================================================

/// One cart line as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLineRequest {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    pub quantity: i64,
    #[serde(default)]
    pub modifier_ids: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Everything needed to create an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateOrderRequest {
    pub order_type: OrderType,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub catering_date: Option<NaiveDate>,
    #[serde(default)]
    pub discount: Option<Discount>,
    pub items: Vec<OrderLineRequest>,
}

/// Quantity and/or notes change on an existing line.
///
/// An empty `notes` string clears the notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A payment submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
    pub payment_method: PaymentMethod,
    pub amount: Money,
    /// CASH only. Defaults to `amount` (exact change) when absent.
    #[serde(default)]
    pub amount_received: Option<Money>,
    /// QRIS/TRANSFER reference.
    #[serde(default)]
    pub reference_number: Option<String>,
}

/// Listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderFilter {
    /// Restrict to these statuses (empty = any).
    #[serde(default)]
    pub statuses: Vec<OrderStatus>,
    /// Only active orders (see [`Order::is_active`]).
    #[serde(default)]
    pub active: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Preparing).unwrap();
        assert_eq!(json, "\"PREPARING\"");

        let json = serde_json::to_string(&CateringStatus::DpPaid).unwrap();
        assert_eq!(json, "\"DP_PAID\"");

        let json = serde_json::to_string(&OrderType::DineIn).unwrap();
        assert_eq!(json, "\"DINE_IN\"");

        let method: PaymentMethod = serde_json::from_str("\"QRIS\"").unwrap();
        assert_eq!(method, PaymentMethod::Qris);
    }

    #[test]
    fn test_order_status_from_str() {
        assert_eq!("preparing".parse::<OrderStatus>().unwrap(), OrderStatus::Preparing);
        assert_eq!(" NEW ".parse::<OrderStatus>().unwrap(), OrderStatus::New);
        assert!("served".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_display_matches_wire_names() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
        for status in ItemStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }

    #[test]
    fn test_line_request_defaults() {
        let line: OrderLineRequest =
            serde_json::from_str(r#"{"product_id":"p-1","quantity":2}"#).unwrap();
        assert_eq!(line.variant_id, None);
        assert!(line.modifier_ids.is_empty());
        assert_eq!(line.notes, None);
    }
}
