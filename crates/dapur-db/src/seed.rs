//! # Demo Data
//!
//! A small warung menu for development and tests. Idempotent: every row is
//! `INSERT OR IGNORE`d under a fixed id.
//!
//! ```text
//! Outlets
//!   outlet-kwr   "Warung Kwitang"   prefix KWR   tax 0%
//!   outlet-smg   "Warung Semanggi"  prefix SMG   tax 11%
//!   outlet-pop   "Pop-up Stand"     (no prefix)  tax 0%
//!
//! Menu
//!   Nasi Goreng   25.000   Level Pedas (pick 1) · Topping (pick 0-2)
//!   Es Teh         8.000   variant Jumbo 12.000
//!   Nasi Box      24.990   catering box
//!   Kopi Tubruk    6.000   inactive
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Fixed ids of the demo rows.
pub mod ids {
    pub const OUTLET_KWR: &str = "outlet-kwr";
    pub const OUTLET_SMG: &str = "outlet-smg";
    pub const OUTLET_POP: &str = "outlet-pop";

    pub const NASI_GORENG: &str = "prod-nasi-goreng";
    pub const ES_TEH: &str = "prod-es-teh";
    pub const ES_TEH_JUMBO: &str = "var-es-teh-jumbo";
    pub const NASI_BOX: &str = "prod-nasi-box";
    pub const KOPI_TUBRUK: &str = "prod-kopi-tubruk";

    pub const GROUP_PEDAS: &str = "grp-level-pedas";
    pub const GROUP_TOPPING: &str = "grp-topping";

    pub const MOD_PEDAS: &str = "mod-pedas";
    pub const MOD_TIDAK_PEDAS: &str = "mod-tidak-pedas";
    pub const MOD_TELUR: &str = "mod-telur";
    pub const MOD_AYAM: &str = "mod-ayam";
    pub const MOD_KERUPUK: &str = "mod-kerupuk";
}

const OUTLETS: &[(&str, &str, Option<&str>, i64)] = &[
    (ids::OUTLET_KWR, "Warung Kwitang", Some("KWR"), 0),
    (ids::OUTLET_SMG, "Warung Semanggi", Some("SMG"), 1_100),
    (ids::OUTLET_POP, "Pop-up Stand", None, 0),
];

/// (id, name, base_price, station, is_active)
const PRODUCTS: &[(&str, &str, i64, Option<&str>, bool)] = &[
    (ids::NASI_GORENG, "Nasi Goreng", 25_000, Some("kitchen"), true),
    (ids::ES_TEH, "Es Teh", 8_000, Some("bar"), true),
    (ids::NASI_BOX, "Nasi Box", 24_990, Some("kitchen"), true),
    (ids::KOPI_TUBRUK, "Kopi Tubruk", 6_000, Some("bar"), false),
];

/// (id, product_id, name, price)
const VARIANTS: &[(&str, &str, &str, i64)] = &[(ids::ES_TEH_JUMBO, ids::ES_TEH, "Jumbo", 12_000)];

/// (id, name, min_select, max_select)
const GROUPS: &[(&str, &str, i64, i64)] = &[
    (ids::GROUP_PEDAS, "Level Pedas", 1, 1),
    (ids::GROUP_TOPPING, "Topping", 0, 2),
];

/// (id, group_id, name, price)
const MODIFIERS: &[(&str, &str, &str, i64)] = &[
    (ids::MOD_PEDAS, ids::GROUP_PEDAS, "Pedas", 0),
    (ids::MOD_TIDAK_PEDAS, ids::GROUP_PEDAS, "Tidak Pedas", 0),
    (ids::MOD_TELUR, ids::GROUP_TOPPING, "Telur Ceplok", 5_000),
    (ids::MOD_AYAM, ids::GROUP_TOPPING, "Ayam Suwir", 7_000),
    (ids::MOD_KERUPUK, ids::GROUP_TOPPING, "Kerupuk", 2_000),
];

/// (product_id, group_id, sort_order)
const PRODUCT_GROUPS: &[(&str, &str, i64)] = &[
    (ids::NASI_GORENG, ids::GROUP_PEDAS, 0),
    (ids::NASI_GORENG, ids::GROUP_TOPPING, 1),
];

/// Inserts the demo outlets and menu.
pub async fn seed_demo_data(pool: &SqlitePool) -> DbResult<()> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    for &(id, name, prefix, tax_rate_bps) in OUTLETS {
        sqlx::query(
            "INSERT OR IGNORE INTO outlets (id, name, order_prefix, tax_rate_bps, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(id)
        .bind(name)
        .bind(prefix)
        .bind(tax_rate_bps)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    for &(id, name, base_price, station, is_active) in PRODUCTS {
        sqlx::query(
            "INSERT OR IGNORE INTO products (id, name, base_price, station, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        )
        .bind(id)
        .bind(name)
        .bind(base_price)
        .bind(station)
        .bind(is_active)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    for &(id, product_id, name, price) in VARIANTS {
        sqlx::query(
            "INSERT OR IGNORE INTO product_variants (id, product_id, name, price) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id)
        .bind(product_id)
        .bind(name)
        .bind(price)
        .execute(&mut *tx)
        .await?;
    }

    for &(id, name, min_select, max_select) in GROUPS {
        sqlx::query(
            "INSERT OR IGNORE INTO modifier_groups (id, name, min_select, max_select) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id)
        .bind(name)
        .bind(min_select)
        .bind(max_select)
        .execute(&mut *tx)
        .await?;
    }

    for &(id, group_id, name, price) in MODIFIERS {
        sqlx::query(
            "INSERT OR IGNORE INTO modifiers (id, group_id, name, price) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id)
        .bind(group_id)
        .bind(name)
        .bind(price)
        .execute(&mut *tx)
        .await?;
    }

    for &(product_id, group_id, sort_order) in PRODUCT_GROUPS {
        sqlx::query(
            "INSERT OR IGNORE INTO product_modifier_groups (product_id, group_id, sort_order) VALUES (?1, ?2, ?3)",
        )
        .bind(product_id)
        .bind(group_id)
        .bind(sort_order)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        outlets = OUTLETS.len(),
        products = PRODUCTS.len(),
        "Demo data seeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_demo_data(db.pool()).await.unwrap();
        seed_demo_data(db.pool()).await.unwrap();

        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(products, PRODUCTS.len() as i64);

        let outlet = db.catalog().outlet(ids::OUTLET_POP).await.unwrap().unwrap();
        assert!(outlet.order_prefix.is_none());
    }
}
