//! # Order Aggregate & State Machine
//!
//! Legal transitions and in-memory mutations of one order. Services load an
//! [`OrderDetail`], apply these operations, then persist what changed.
//!
//! ## Order Status
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   NEW ──────► PREPARING ──────► READY ──────► COMPLETED ■              │
//! │    │              │                                                     │
//! │    │              ▼                                                     │
//! │    └────────► CANCELLED ■                                               │
//! │                                                                         │
//! │   ■ terminal: nothing on the order or its items changes afterwards     │
//! │                                                                         │
//! │   Full payment completes the order from any non-terminal status        │
//! │   (see `complete_by_settlement`).                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Item Status
//! `PENDING → PREPARING → READY`, set per item by the kitchen. Item status
//! does not gate order status. Adding, updating or removing items is only
//! legal while the order is NEW.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::compute_totals;
use crate::types::{
    CateringStatus, ItemStatus, Order, OrderDetail, OrderItem, OrderStatus, UpdateItemRequest,
};
use crate::validation::{validate_notes, validate_quantity};

// =============================================================================
// Transition Tables
// =============================================================================

impl OrderStatus {
    /// Whether `self → next` is a legal edge.
    pub const fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (New, Preparing)
                | (Preparing, Ready)
                | (Ready, Completed)
                | (New, Cancelled)
                | (Preparing, Cancelled)
        )
    }
}

impl ItemStatus {
    /// Whether `self → next` is a legal edge.
    pub const fn can_transition_to(self, next: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!((self, next), (Pending, Preparing) | (Preparing, Ready))
    }
}

// =============================================================================
// Order Header Operations
// =============================================================================

impl Order {
    /// Moves the order along a legal edge.
    ///
    /// Cancelling a catering order also cancels its catering sub-state.
    pub fn transition_to(&mut self, next: OrderStatus, now: DateTime<Utc>) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.updated_at = now;

        match next {
            OrderStatus::Completed => self.completed_at = Some(now),
            OrderStatus::Cancelled => {
                if let Some(catering) = self.catering_status.as_mut() {
                    if !catering.is_closed() {
                        *catering = CateringStatus::Cancelled;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Completes the order because it is fully paid.
    ///
    /// Unlike [`transition_to`](Self::transition_to) this accepts any
    /// non-terminal status: a paid order leaves the queue regardless of
    /// how far the kitchen got.
    pub fn complete_by_settlement(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Completed,
            });
        }
        self.status = OrderStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Marks the order fully paid: catering becomes SETTLED and the order
    /// COMPLETED.
    pub fn settle(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.is_catering() {
            self.catering_status = Some(CateringStatus::Settled);
        }
        self.complete_by_settlement(now)
    }

    /// Items may only change while the order is NEW.
    pub fn ensure_editable(&self) -> CoreResult<()> {
        if self.status != OrderStatus::New {
            return Err(CoreError::OrderNotEditable {
                order_id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// Payments are refused once the order is cancelled or completed.
    pub fn ensure_payable(&self) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(CoreError::OrderNotPayable {
                order_id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Aggregate Operations
// =============================================================================

impl OrderDetail {
    /// Recomputes `subtotal` from the items and derives the remaining totals
    /// with the order's stored discount and tax rate.
    pub fn recalculate(&mut self, now: DateTime<Utc>) {
        let subtotal: Money = self.items.iter().map(|i| i.subtotal).sum();
        let discount = self.order.discount();
        let totals = compute_totals(subtotal, discount.as_ref(), self.order.tax_rate);

        self.order.subtotal = totals.subtotal;
        self.order.discount_amount = totals.discount_amount;
        self.order.tax_amount = totals.tax_amount;
        self.order.total_amount = totals.total_amount;
        self.order.updated_at = now;
    }

    /// Rejects edits that would leave the order owing less than was paid.
    pub fn ensure_total_covers_paid(&self) -> CoreResult<()> {
        if self.order.total_amount < self.order.amount_paid {
            return Err(CoreError::TotalBelowAmountPaid {
                total: self.order.total_amount,
                paid: self.order.amount_paid,
            });
        }
        Ok(())
    }

    /// Settles the order when an edit left nothing owing on money already
    /// received. Returns whether the status moved.
    ///
    /// An order with nothing paid is never settled this way, so an emptied
    /// unpaid cart stays NEW.
    pub fn settle_if_fully_paid(&mut self, now: DateTime<Utc>) -> CoreResult<bool> {
        let order = &self.order;
        if order.status.is_terminal()
            || !order.amount_paid.is_positive()
            || order.amount_paid < order.total_amount
        {
            return Ok(false);
        }
        self.order.settle(now)?;
        Ok(true)
    }

    /// Appends a freshly priced item and recomputes totals.
    pub fn add_item(&mut self, item: OrderItem, now: DateTime<Utc>) -> CoreResult<()> {
        self.order.ensure_editable()?;
        self.items.push(item);
        self.recalculate(now);
        Ok(())
    }

    /// Changes quantity and/or notes. Prices are never re-resolved.
    pub fn update_item(
        &mut self,
        item_id: &str,
        update: &UpdateItemRequest,
        now: DateTime<Utc>,
    ) -> CoreResult<&OrderItem> {
        self.order.ensure_editable()?;
        if let Some(quantity) = update.quantity {
            validate_quantity(quantity)?;
        }
        if let Some(notes) = &update.notes {
            validate_notes(notes)?;
        }

        let index = self.item_index(item_id)?;
        {
            let item = &mut self.items[index];
            if let Some(quantity) = update.quantity {
                item.quantity = quantity;
            }
            if let Some(notes) = &update.notes {
                item.notes = normalize_notes(notes);
            }
            item.recompute_subtotal();
            item.updated_at = now;
        }
        self.recalculate(now);
        Ok(&self.items[index])
    }

    /// Removes an item with its modifiers. Removing the last item leaves an
    /// empty NEW order; cancelling it is the caller's decision.
    pub fn remove_item(&mut self, item_id: &str, now: DateTime<Utc>) -> CoreResult<OrderItem> {
        self.order.ensure_editable()?;
        let index = self.item_index(item_id)?;
        let removed = self.items.remove(index);
        self.recalculate(now);
        Ok(removed)
    }

    /// Sets the kitchen status of one item.
    pub fn set_item_status(
        &mut self,
        item_id: &str,
        next: ItemStatus,
        now: DateTime<Utc>,
    ) -> CoreResult<&OrderItem> {
        if self.order.status.is_terminal() {
            return Err(CoreError::OrderNotEditable {
                order_id: self.order.id.clone(),
                status: self.order.status,
            });
        }
        let index = self.item_index(item_id)?;
        let item = &mut self.items[index];
        if !item.status.can_transition_to(next) {
            return Err(CoreError::InvalidItemTransition {
                from: item.status,
                to: next,
            });
        }
        item.status = next;
        item.updated_at = now;
        self.order.updated_at = now;
        Ok(&self.items[index])
    }

    fn item_index(&self, item_id: &str) -> CoreResult<usize> {
        self.items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound {
                order_id: self.order.id.clone(),
                item_id: item_id.to_string(),
            })
    }
}

/// Trims notes; blank becomes `None`.
pub fn normalize_notes(notes: &str) -> Option<String> {
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
