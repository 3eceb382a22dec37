//! # Catalog Snapshot
//!
//! Read-only view of the menu, resolved once per request and used to price
//! cart lines. The order engine freezes the result into the order.
//!
//! ## Validation Order
//! ```text
//! OrderLineRequest
//!      │
//!      ▼
//! 1. product resolves and is active ─────────── else UnknownProduct
//!      │
//!      ▼
//! 2. variant (if any) belongs to product ────── else VariantMismatch
//!      │
//!      ▼
//! 3. every modifier in an attached group,
//!    no duplicates, min/max per group ───────── else ModifierConstraintViolated
//!      │
//!      ▼
//! PricedLine { unit_price, modifiers, subtotal }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};
use crate::types::{ItemStatus, OrderItem, OrderItemModifier, OrderLineRequest};

// =============================================================================
// Catalog Types
// =============================================================================

/// Outlet settings read at order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outlet {
    pub id: String,
    pub name: String,
    /// Order-number prefix; the configured default applies when absent.
    pub order_prefix: Option<String>,
    /// Flat tax rate, copied onto each order.
    pub tax_rate: TaxRate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub base_price: Money,
    pub is_active: bool,
    pub station: Option<String>,
    pub variants: Vec<CatalogVariant>,
    pub modifier_groups: Vec<CatalogModifierGroup>,
}

/// A product variant with an absolute price (replaces the base price).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVariant {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogModifierGroup {
    pub id: String,
    pub name: String,
    pub min_select: u32,
    pub max_select: u32,
    pub modifiers: Vec<CatalogModifier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogModifier {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub price: Money,
}

/// Products keyed by id, as resolved for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    products: HashMap<String, CatalogProduct>,
}

impl CatalogSnapshot {
    pub fn from_products(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
        CatalogSnapshot {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn get(&self, product_id: &str) -> Option<&CatalogProduct> {
        self.products.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Prices one line against the snapshot.
    pub fn price_line(&self, line: &OrderLineRequest) -> CoreResult<PricedLine> {
        let product = self
            .get(&line.product_id)
            .filter(|p| p.is_active)
            .ok_or_else(|| CoreError::UnknownProduct {
                product_id: line.product_id.clone(),
            })?;

        let variant = match &line.variant_id {
            Some(variant_id) => Some(
                product
                    .variants
                    .iter()
                    .find(|v| &v.id == variant_id && v.product_id == product.id)
                    .ok_or_else(|| CoreError::VariantMismatch {
                        product_id: product.id.clone(),
                        variant_id: variant_id.clone(),
                    })?,
            ),
            None => None,
        };

        let modifiers = select_modifiers(product, &line.modifier_ids)?;

        let unit_price = variant.map(|v| v.price).unwrap_or(product.base_price);
        let modifiers_total: Money = modifiers.iter().map(|m| m.price).sum();

        Ok(PricedLine {
            product_id: product.id.clone(),
            variant_id: variant.map(|v| v.id.clone()),
            product_name: product.name.clone(),
            variant_name: variant.map(|v| v.name.clone()),
            station: product.station.clone(),
            quantity: line.quantity,
            unit_price,
            modifiers,
            subtotal: (unit_price + modifiers_total) * line.quantity,
            notes: line.notes.clone(),
        })
    }
}

/// Checks the selection against the product's groups and returns the chosen
/// modifiers in request order.
fn select_modifiers(
    product: &CatalogProduct,
    modifier_ids: &[String],
) -> CoreResult<Vec<CatalogModifier>> {
    let violation = |reason: String| CoreError::ModifierConstraintViolated {
        product_id: product.id.clone(),
        reason,
    };

    let mut seen = HashSet::new();
    let mut per_group: HashMap<&str, u32> = HashMap::new();
    let mut selected = Vec::with_capacity(modifier_ids.len());

    for modifier_id in modifier_ids {
        if !seen.insert(modifier_id.as_str()) {
            return Err(violation(format!("modifier {} selected twice", modifier_id)));
        }
        let (group, modifier) = product
            .modifier_groups
            .iter()
            .find_map(|g| {
                g.modifiers
                    .iter()
                    .find(|m| &m.id == modifier_id)
                    .map(|m| (g, m))
            })
            .ok_or_else(|| violation(format!("modifier {} is not offered", modifier_id)))?;

        *per_group.entry(group.id.as_str()).or_default() += 1;
        selected.push(modifier.clone());
    }

    for group in &product.modifier_groups {
        let count = per_group.get(group.id.as_str()).copied().unwrap_or(0);
        if count < group.min_select || count > group.max_select {
            return Err(violation(format!(
                "group '{}' needs {}..={} selections, got {}",
                group.name, group.min_select, group.max_select, count
            )));
        }
    }

    Ok(selected)
}

// =============================================================================
// Priced Line
// =============================================================================

/// A cart line with prices resolved and frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub station: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub modifiers: Vec<CatalogModifier>,
    pub subtotal: Money,
    pub notes: Option<String>,
}

impl PricedLine {
    /// Materializes the line as a new PENDING item on `order_id`.
    pub fn into_item(self, order_id: &str, now: DateTime<Utc>) -> OrderItem {
        let item_id = Uuid::new_v4().to_string();
        let modifiers = self
            .modifiers
            .into_iter()
            .map(|m| OrderItemModifier {
                id: Uuid::new_v4().to_string(),
                order_item_id: item_id.clone(),
                modifier_id: m.id,
                modifier_group_id: m.group_id,
                name: m.name,
                unit_price: m.price,
            })
            .collect();

        OrderItem {
            id: item_id,
            order_id: order_id.to_string(),
            product_id: self.product_id,
            variant_id: self.variant_id,
            product_name: self.product_name,
            variant_name: self.variant_name,
            station: self.station,
            quantity: self.quantity,
            unit_price: self.unit_price,
            subtotal: self.subtotal,
            notes: self.notes,
            status: ItemStatus::Pending,
            modifiers,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
