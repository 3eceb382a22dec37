//! # Catalog Repository
//!
//! Read-only lookups against the menu and outlet tables.
//!
//! ## Resolve
//! ```text
//! product_ids ──► products ──┬──► product_variants
//!                            ├──► product_modifier_groups ⨝ modifier_groups
//!                            └──► modifiers (of those groups)
//!                                      │
//!                                      ▼
//!                              CatalogSnapshot (dapur-core)
//! ```
//!
//! Four queries per resolve regardless of how many lines the cart has.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::error::{DbError, DbResult};
use dapur_core::catalog::{
    CatalogModifier, CatalogModifierGroup, CatalogProduct, CatalogSnapshot, CatalogVariant, Outlet,
};
use dapur_core::{Money, TaxRate};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OutletRow {
    id: String,
    name: String,
    order_prefix: Option<String>,
    tax_rate_bps: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    base_price: i64,
    station: Option<String>,
    is_active: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: String,
    product_id: String,
    name: String,
    price: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    product_id: String,
    id: String,
    name: String,
    min_select: i64,
    max_select: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ModifierRow {
    id: String,
    group_id: String,
    name: String,
    price: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog and outlet lookups.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Gets an outlet by ID.
    pub async fn outlet(&self, outlet_id: &str) -> DbResult<Option<Outlet>> {
        let row: Option<OutletRow> = sqlx::query_as(
            "SELECT id, name, order_prefix, tax_rate_bps FROM outlets WHERE id = ?1",
        )
        .bind(outlet_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| -> DbResult<Outlet> {
            Ok(Outlet {
                tax_rate: TaxRate::from_bps(to_u32("outlets.tax_rate_bps", r.tax_rate_bps)?),
                id: r.id,
                name: r.name,
                order_prefix: r.order_prefix,
            })
        })
        .transpose()
    }

    /// Loads every referenced product with its variants and modifier groups.
    ///
    /// Unknown ids are simply absent from the snapshot; pricing reports them
    /// as `UnknownProduct`.
    pub async fn resolve<S: AsRef<str>>(&self, product_ids: &[S]) -> DbResult<CatalogSnapshot> {
        let ids: BTreeSet<&str> = product_ids.iter().map(|s| s.as_ref()).collect();
        if ids.is_empty() {
            return Ok(CatalogSnapshot::default());
        }
        debug!(count = ids.len(), "Resolving catalog snapshot");

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, name, base_price, station, is_active FROM products WHERE id IN ",
        );
        push_id_list(&mut query, &ids);
        let products: Vec<ProductRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, product_id, name, price FROM product_variants WHERE product_id IN ",
        );
        push_id_list(&mut query, &ids);
        query.push(" ORDER BY product_id, rowid");
        let variants: Vec<VariantRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT pmg.product_id, g.id, g.name, g.min_select, g.max_select \
             FROM product_modifier_groups pmg \
             JOIN modifier_groups g ON g.id = pmg.group_id \
             WHERE pmg.product_id IN ",
        );
        push_id_list(&mut query, &ids);
        query.push(" ORDER BY pmg.product_id, pmg.sort_order");
        let groups: Vec<GroupRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT m.id, m.group_id, m.name, m.price FROM modifiers m \
             WHERE m.group_id IN (SELECT group_id FROM product_modifier_groups WHERE product_id IN ",
        );
        push_id_list(&mut query, &ids);
        query.push(") ORDER BY m.group_id, m.rowid");
        let modifiers: Vec<ModifierRow> = query.build_query_as().fetch_all(&self.pool).await?;

        assemble(products, variants, groups, modifiers)
    }
}

fn push_id_list(query: &mut QueryBuilder<'_, Sqlite>, ids: &BTreeSet<&str>) {
    query.push("(");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(id.to_string());
    }
    separated.push_unseparated(")");
}

fn assemble(
    products: Vec<ProductRow>,
    variants: Vec<VariantRow>,
    groups: Vec<GroupRow>,
    modifiers: Vec<ModifierRow>,
) -> DbResult<CatalogSnapshot> {
    let mut modifiers_by_group: HashMap<String, Vec<CatalogModifier>> = HashMap::new();
    for m in modifiers {
        modifiers_by_group
            .entry(m.group_id.clone())
            .or_default()
            .push(CatalogModifier {
                id: m.id,
                group_id: m.group_id,
                name: m.name,
                price: Money::from_minor(m.price),
            });
    }

    let mut groups_by_product: HashMap<String, Vec<CatalogModifierGroup>> = HashMap::new();
    for g in groups {
        let group = CatalogModifierGroup {
            modifiers: modifiers_by_group.get(&g.id).cloned().unwrap_or_default(),
            min_select: to_u32("modifier_groups.min_select", g.min_select)?,
            max_select: to_u32("modifier_groups.max_select", g.max_select)?,
            id: g.id,
            name: g.name,
        };
        groups_by_product.entry(g.product_id).or_default().push(group);
    }

    let mut variants_by_product: HashMap<String, Vec<CatalogVariant>> = HashMap::new();
    for v in variants {
        variants_by_product
            .entry(v.product_id.clone())
            .or_default()
            .push(CatalogVariant {
                id: v.id,
                product_id: v.product_id,
                name: v.name,
                price: Money::from_minor(v.price),
            });
    }

    let products = products.into_iter().map(|p| CatalogProduct {
        variants: variants_by_product.remove(&p.id).unwrap_or_default(),
        modifier_groups: groups_by_product.remove(&p.id).unwrap_or_default(),
        id: p.id,
        name: p.name,
        base_price: Money::from_minor(p.base_price),
        is_active: p.is_active,
        station: p.station,
    });

    Ok(CatalogSnapshot::from_products(products.collect::<Vec<_>>()))
}

fn to_u32(column: &str, value: i64) -> DbResult<u32> {
    u32::try_from(value)
        .map_err(|_| DbError::Internal(format!("{} out of range: {}", column, value)))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::seed::{self, ids};
    use dapur_core::OrderLineRequest;

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed::seed_demo_data(db.pool()).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_outlet_lookup() {
        let db = seeded().await;
        let outlet = db.catalog().outlet(ids::OUTLET_KWR).await.unwrap().unwrap();
        assert_eq!(outlet.order_prefix.as_deref(), Some("KWR"));
        assert!(outlet.tax_rate.is_zero());

        assert!(db.catalog().outlet("nowhere").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_builds_full_snapshot() {
        let db = seeded().await;
        let snapshot = db
            .catalog()
            .resolve(&[ids::NASI_GORENG, ids::ES_TEH, ids::NASI_GORENG, "ghost"])
            .await
            .unwrap();

        assert_eq!(snapshot.len(), 2);
        let nasi = snapshot.get(ids::NASI_GORENG).unwrap();
        assert_eq!(nasi.base_price.minor(), 25_000);
        assert_eq!(nasi.modifier_groups.len(), 2);
        assert!(nasi.modifier_groups.iter().all(|g| !g.modifiers.is_empty()));

        let es_teh = snapshot.get(ids::ES_TEH).unwrap();
        assert_eq!(es_teh.variants.len(), 1);
        assert!(snapshot.get("ghost").is_none());
    }

    #[tokio::test]
    async fn test_resolved_snapshot_prices_lines() {
        let db = seeded().await;
        let snapshot = db.catalog().resolve(&[ids::NASI_GORENG]).await.unwrap();
        let priced = snapshot
            .price_line(&OrderLineRequest {
                product_id: ids::NASI_GORENG.into(),
                variant_id: None,
                quantity: 2,
                modifier_ids: vec![ids::MOD_PEDAS.into(), ids::MOD_TELUR.into()],
                notes: None,
            })
            .unwrap();
        assert_eq!(priced.subtotal.minor(), 60_000);
    }

    #[tokio::test]
    async fn test_resolve_empty() {
        let db = seeded().await;
        let none: [&str; 0] = [];
        assert!(db.catalog().resolve(&none).await.unwrap().is_empty());
    }
}
