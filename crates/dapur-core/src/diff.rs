//! # Item Diff Planning
//!
//! Turns a bulk-edited cart into the minimal set of add / update / remove
//! operations against the order's current items.
//!
//! ```text
//!   current:  [A ×1] [B ×2]
//!   desired:  [A ×1] [    C ×1 (no id)    ]
//!                │
//!                ▼
//!   ┌──────────┬─────────────┬─────────────┐
//!   │ to_add   │ to_update   │ to_remove   │
//!   │ C ×1     │ (none)      │ B           │
//!   └──────────┴─────────────┴─────────────┘
//! ```
//!
//! Lines with a persisted `id` are existing items; only their quantity and
//! notes are compared. Product, variant and modifiers on an existing line are
//! ignored because its price snapshot is never re-resolved.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::order::normalize_notes;
use crate::types::{OrderItem, OrderLineRequest, UpdateItemRequest};
use crate::validation::{validate_line, validate_notes, validate_quantity};

/// One line of the desired cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DesiredItem {
    /// Persisted item id, absent for new lines.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub line: OrderLineRequest,
}

/// An existing line whose quantity or notes changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
    pub item_id: String,
    pub update: UpdateItemRequest,
}

/// The three disjoint operation sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDiff {
    pub to_add: Vec<OrderLineRequest>,
    pub to_update: Vec<ItemUpdate>,
    pub to_remove: Vec<String>,
}

impl ItemDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes the diff between `current` items and the `desired` cart.
///
/// ## Errors
/// - `ItemNotFound` if a desired id is not on the order
/// - `Validation(Duplicate)` if the same id appears twice
/// - field validation errors for quantities and notes
pub fn plan_item_diff(
    order_id: &str,
    current: &[OrderItem],
    desired: &[DesiredItem],
) -> CoreResult<ItemDiff> {
    let mut diff = ItemDiff::default();
    let mut kept: HashSet<&str> = HashSet::new();

    for wanted in desired {
        let Some(id) = wanted.id.as_deref() else {
            validate_line(&wanted.line)?;
            diff.to_add.push(wanted.line.clone());
            continue;
        };

        if !kept.insert(id) {
            return Err(ValidationError::Duplicate {
                field: "items.id".to_string(),
                value: id.to_string(),
            }
            .into());
        }
        let existing = current
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| CoreError::ItemNotFound {
                order_id: order_id.to_string(),
                item_id: id.to_string(),
            })?;

        validate_quantity(wanted.line.quantity)?;
        let notes = match &wanted.line.notes {
            Some(notes) => {
                validate_notes(notes)?;
                normalize_notes(notes)
            }
            None => None,
        };

        let quantity_changed = existing.quantity != wanted.line.quantity;
        let notes_changed = existing.notes != notes;
        if quantity_changed || notes_changed {
            diff.to_update.push(ItemUpdate {
                item_id: existing.id.clone(),
                update: UpdateItemRequest {
                    quantity: quantity_changed.then_some(wanted.line.quantity),
                    notes: notes_changed.then(|| notes.unwrap_or_default()),
                },
            });
        }
    }

    diff.to_remove = current
        .iter()
        .filter(|i| !kept.contains(i.id.as_str()))
        .map(|i| i.id.clone())
        .collect();

    Ok(diff)
}

// =============================================================================
// Unit Tests
// =============================================================================
