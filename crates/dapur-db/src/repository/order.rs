//! # Order Repository
//!
//! Database operations for orders, items and item modifiers.
//!
//! ## Transaction Functions vs. Repository
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Free functions take `&mut SqliteConnection` so a service can run      │
//! │  several of them inside ONE transaction:                               │
//! │                                                                         │
//! │    let mut tx = db.begin().await?;                                     │
//! │    lock_order(&mut tx, outlet, id).await?;   ← write first (row lock)  │
//! │    let detail = fetch_detail(&mut tx, ..)?;  ← then read fresh state   │
//! │    insert_item(&mut tx, &item).await?;                                 │
//! │    update_order_header(&mut tx, &detail.order).await?;                 │
//! │    tx.commit().await?;                                                 │
//! │                                                                         │
//! │  `OrderRepository` wraps the pool for the read-only query path.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every lookup is outlet-scoped: an order of another outlet is not found.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::payment::fetch_payments;
use dapur_core::{
    CateringStatus, DiscountType, ItemStatus, Money, Order, OrderDetail, OrderFilter, OrderItem,
    OrderItemModifier, OrderStatus, OrderType, TaxRate,
};

// =============================================================================
// Rows
// =============================================================================

const ORDER_COLUMNS: &str = "id, outlet_id, order_number, order_seq, business_date, order_type, \
     status, table_number, customer_id, customer_name, notes, subtotal, discount_type, \
     discount_value, discount_amount, tax_rate_bps, tax_amount, total_amount, amount_paid, \
     catering_date, catering_status, catering_dp_amount, created_by, created_at, updated_at, \
     completed_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    outlet_id: String,
    order_number: String,
    order_seq: i64,
    business_date: NaiveDate,
    order_type: OrderType,
    status: OrderStatus,
    table_number: Option<String>,
    customer_id: Option<String>,
    customer_name: Option<String>,
    notes: Option<String>,
    subtotal: i64,
    discount_type: Option<DiscountType>,
    discount_value: i64,
    discount_amount: i64,
    tax_rate_bps: i64,
    tax_amount: i64,
    total_amount: i64,
    amount_paid: i64,
    catering_date: Option<NaiveDate>,
    catering_status: Option<CateringStatus>,
    catering_dp_amount: Option<i64>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(r: OrderRow) -> DbResult<Self> {
        let tax_rate_bps = u32::try_from(r.tax_rate_bps).map_err(|_| {
            DbError::Internal(format!("orders.tax_rate_bps out of range: {}", r.tax_rate_bps))
        })?;

        Ok(Order {
            id: r.id,
            outlet_id: r.outlet_id,
            order_number: r.order_number,
            order_seq: r.order_seq,
            business_date: r.business_date,
            order_type: r.order_type,
            status: r.status,
            table_number: r.table_number,
            customer_id: r.customer_id,
            customer_name: r.customer_name,
            notes: r.notes,
            subtotal: Money::from_minor(r.subtotal),
            discount_type: r.discount_type,
            discount_value: r.discount_value,
            discount_amount: Money::from_minor(r.discount_amount),
            tax_rate: TaxRate::from_bps(tax_rate_bps),
            tax_amount: Money::from_minor(r.tax_amount),
            total_amount: Money::from_minor(r.total_amount),
            amount_paid: Money::from_minor(r.amount_paid),
            catering_date: r.catering_date,
            catering_status: r.catering_status,
            catering_dp_amount: r.catering_dp_amount.map(Money::from_minor),
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
            completed_at: r.completed_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    order_id: String,
    product_id: String,
    variant_id: Option<String>,
    product_name: String,
    variant_name: Option<String>,
    station: Option<String>,
    quantity: i64,
    unit_price: i64,
    subtotal: i64,
    notes: Option<String>,
    status: ItemStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemModifierRow {
    id: String,
    order_item_id: String,
    modifier_id: String,
    modifier_group_id: String,
    name: String,
    unit_price: i64,
}

// =============================================================================
// Transaction Functions
// =============================================================================

/// Takes the write lock on an order row before anything is read.
///
/// Under SQLite's single-writer model this is the row lock: a concurrent
/// mutation of the same order waits here until the first one commits.
pub async fn lock_order(conn: &mut SqliteConnection, outlet_id: &str, order_id: &str) -> DbResult<()> {
    let result = sqlx::query("UPDATE orders SET updated_at = updated_at WHERE id = ?1 AND outlet_id = ?2")
        .bind(order_id)
        .bind(outlet_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order", order_id));
    }
    Ok(())
}

/// Gets an order header.
pub async fn fetch_order(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    order_id: &str,
) -> DbResult<Option<Order>> {
    let sql = format!(
        "SELECT {} FROM orders WHERE id = ?1 AND outlet_id = ?2",
        ORDER_COLUMNS
    );
    let row: Option<OrderRow> = sqlx::query_as(&sql)
        .bind(order_id)
        .bind(outlet_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(Order::try_from).transpose()
}

/// Gets an order with items, modifiers and payments.
pub async fn fetch_detail(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    order_id: &str,
) -> DbResult<Option<OrderDetail>> {
    let Some(order) = fetch_order(conn, outlet_id, order_id).await? else {
        return Ok(None);
    };
    let items = fetch_items(conn, order_id).await?;
    let payments = fetch_payments(conn, order_id).await?;

    Ok(Some(OrderDetail {
        order,
        items,
        payments,
    }))
}

/// Like [`fetch_detail`] but a missing order is an error.
pub async fn require_detail(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    order_id: &str,
) -> DbResult<OrderDetail> {
    fetch_detail(conn, outlet_id, order_id)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))
}

async fn fetch_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderItem>> {
    let rows: Vec<ItemRow> = sqlx::query_as(
        r#"
        SELECT id, order_id, product_id, variant_id, product_name, variant_name, station,
               quantity, unit_price, subtotal, notes, status, created_at, updated_at
        FROM order_items
        WHERE order_id = ?1
        ORDER BY position, rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let modifier_rows: Vec<ItemModifierRow> = sqlx::query_as(
        r#"
        SELECT m.id, m.order_item_id, m.modifier_id, m.modifier_group_id, m.name, m.unit_price
        FROM order_item_modifiers m
        JOIN order_items i ON i.id = m.order_item_id
        WHERE i.order_id = ?1
        ORDER BY m.position, m.rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut modifiers: HashMap<String, Vec<OrderItemModifier>> = HashMap::new();
    for m in modifier_rows {
        modifiers
            .entry(m.order_item_id.clone())
            .or_default()
            .push(OrderItemModifier {
                id: m.id,
                order_item_id: m.order_item_id,
                modifier_id: m.modifier_id,
                modifier_group_id: m.modifier_group_id,
                name: m.name,
                unit_price: Money::from_minor(m.unit_price),
            });
    }

    Ok(rows
        .into_iter()
        .map(|r| OrderItem {
            modifiers: modifiers.remove(&r.id).unwrap_or_default(),
            id: r.id,
            order_id: r.order_id,
            product_id: r.product_id,
            variant_id: r.variant_id,
            product_name: r.product_name,
            variant_name: r.variant_name,
            station: r.station,
            quantity: r.quantity,
            unit_price: Money::from_minor(r.unit_price),
            subtotal: Money::from_minor(r.subtotal),
            notes: r.notes,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
        .collect())
}

/// Inserts a new order header.
pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, outlet_id, order_number, order_seq, business_date, order_type,
            status, table_number, customer_id, customer_name, notes,
            subtotal, discount_type, discount_value, discount_amount,
            tax_rate_bps, tax_amount, total_amount, amount_paid,
            catering_date, catering_status, catering_dp_amount,
            created_by, created_at, updated_at, completed_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15,
            ?16, ?17, ?18, ?19,
            ?20, ?21, ?22,
            ?23, ?24, ?25, ?26
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.outlet_id)
    .bind(&order.order_number)
    .bind(order.order_seq)
    .bind(order.business_date)
    .bind(order.order_type)
    .bind(order.status)
    .bind(&order.table_number)
    .bind(&order.customer_id)
    .bind(&order.customer_name)
    .bind(&order.notes)
    .bind(order.subtotal.minor())
    .bind(order.discount_type)
    .bind(order.discount_value)
    .bind(order.discount_amount.minor())
    .bind(i64::from(order.tax_rate.bps()))
    .bind(order.tax_amount.minor())
    .bind(order.total_amount.minor())
    .bind(order.amount_paid.minor())
    .bind(order.catering_date)
    .bind(order.catering_status)
    .bind(order.catering_dp_amount.map(|m| m.minor()))
    .bind(&order.created_by)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.completed_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Persists the mutable header fields: status, totals, payment state.
pub async fn update_order_header(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = ?3,
            subtotal = ?4,
            discount_amount = ?5,
            tax_amount = ?6,
            total_amount = ?7,
            amount_paid = ?8,
            catering_status = ?9,
            catering_dp_amount = ?10,
            updated_at = ?11,
            completed_at = ?12
        WHERE id = ?1 AND outlet_id = ?2
        "#,
    )
    .bind(&order.id)
    .bind(&order.outlet_id)
    .bind(order.status)
    .bind(order.subtotal.minor())
    .bind(order.discount_amount.minor())
    .bind(order.tax_amount.minor())
    .bind(order.total_amount.minor())
    .bind(order.amount_paid.minor())
    .bind(order.catering_status)
    .bind(order.catering_dp_amount.map(|m| m.minor()))
    .bind(order.updated_at)
    .bind(order.completed_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order", &order.id));
    }
    Ok(())
}

/// Inserts an item and its modifiers at the end of the order.
///
/// ## Snapshot Pattern
/// Names and prices are copied from the catalog into the row. They are
/// never re-read from the catalog afterwards.
pub async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
    debug!(order_id = %item.order_id, product_id = %item.product_id, "Inserting order item");

    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, variant_id, product_name, variant_name, station,
            quantity, unit_price, subtotal, notes, status, position, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12,
            (SELECT COALESCE(MAX(position), -1) + 1 FROM order_items WHERE order_id = ?2),
            ?13, ?14
        )
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.variant_id)
    .bind(&item.product_name)
    .bind(&item.variant_name)
    .bind(&item.station)
    .bind(item.quantity)
    .bind(item.unit_price.minor())
    .bind(item.subtotal.minor())
    .bind(&item.notes)
    .bind(item.status)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(&mut *conn)
    .await?;

    for (position, modifier) in item.modifiers.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_item_modifiers (
                id, order_item_id, modifier_id, modifier_group_id, name, unit_price, position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&modifier.id)
        .bind(&modifier.order_item_id)
        .bind(&modifier.modifier_id)
        .bind(&modifier.modifier_group_id)
        .bind(&modifier.name)
        .bind(modifier.unit_price.minor())
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Persists quantity, notes, subtotal and kitchen status of an item.
pub async fn update_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE order_items SET
            quantity = ?3,
            subtotal = ?4,
            notes = ?5,
            status = ?6,
            updated_at = ?7
        WHERE id = ?1 AND order_id = ?2
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(item.quantity)
    .bind(item.subtotal.minor())
    .bind(&item.notes)
    .bind(item.status)
    .bind(item.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("OrderItem", &item.id));
    }
    Ok(())
}

/// Deletes an item; its modifiers go with it (ON DELETE CASCADE).
pub async fn delete_item(conn: &mut SqliteConnection, order_id: &str, item_id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM order_items WHERE id = ?1 AND order_id = ?2")
        .bind(item_id)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("OrderItem", item_id));
    }
    Ok(())
}

// =============================================================================
// Repository (query path)
// =============================================================================

/// Maximum orders returned by one listing call.
pub const DEFAULT_LIST_LIMIT: i64 = 200;

/// Repository for order read operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order with items, modifiers and payments.
    pub async fn get(&self, outlet_id: &str, order_id: &str) -> DbResult<Option<OrderDetail>> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut conn, outlet_id, order_id).await
    }

    /// Lists order headers of an outlet, newest first.
    ///
    /// `filter.active` keeps NEW/PREPARING/READY orders plus catering
    /// bookings that are not yet settled or cancelled.
    pub async fn list(&self, outlet_id: &str, filter: &OrderFilter, limit: i64) -> DbResult<Vec<Order>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM orders WHERE outlet_id = ", ORDER_COLUMNS));
        query.push_bind(outlet_id.to_string());

        if !filter.statuses.is_empty() {
            query.push(" AND status IN (");
            let mut separated = query.separated(", ");
            for status in &filter.statuses {
                separated.push_bind(*status);
            }
            separated.push_unseparated(")");
        }

        if filter.active {
            query.push(
                " AND (status IN ('NEW', 'PREPARING', 'READY') \
                 OR (order_type = 'CATERING' AND catering_status IN ('BOOKED', 'DP_PAID')))",
            );
        }

        query.push(" ORDER BY created_at DESC, order_seq DESC LIMIT ");
        query.push_bind(limit.clamp(1, 1_000));

        let rows: Vec<OrderRow> = query.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Order::try_from).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::seed::{self, ids};
    use dapur_core::catalog::CatalogSnapshot;
    use dapur_core::numbering::format_order_number;
    use dapur_core::{OrderLineRequest, UpdateItemRequest};
    use uuid::Uuid;

    pub(crate) async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed::seed_demo_data(db.pool()).await.unwrap();
        db
    }

    pub(crate) fn new_order(outlet_id: &str, seq: i64, order_type: OrderType) -> Order {
        let now = Utc::now();
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        Order {
            id: Uuid::new_v4().to_string(),
            outlet_id: outlet_id.to_string(),
            order_number: format_order_number("KWR", date, seq),
            order_seq: seq,
            business_date: date,
            order_type,
            status: OrderStatus::New,
            table_number: Some("A3".into()),
            customer_id: None,
            customer_name: None,
            notes: None,
            subtotal: Money::zero(),
            discount_type: None,
            discount_value: 0,
            discount_amount: Money::zero(),
            tax_rate: TaxRate::zero(),
            tax_amount: Money::zero(),
            total_amount: Money::zero(),
            amount_paid: Money::zero(),
            catering_date: None,
            catering_status: (order_type == OrderType::Catering).then_some(CateringStatus::Booked),
            catering_dp_amount: None,
            created_by: "cashier-1".into(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn line(product_id: &str, quantity: i64, modifiers: &[&str]) -> OrderLineRequest {
        OrderLineRequest {
            product_id: product_id.into(),
            variant_id: None,
            quantity,
            modifier_ids: modifiers.iter().map(|m| m.to_string()).collect(),
            notes: None,
        }
    }

    /// Persists a NEW order with Nasi Goreng ×2 + Es Teh ×2.
    pub(crate) async fn persisted_detail(db: &Database) -> OrderDetail {
        let snapshot: CatalogSnapshot = db
            .catalog()
            .resolve(&[ids::NASI_GORENG, ids::ES_TEH])
            .await
            .unwrap();
        let now = Utc::now();
        let mut detail = OrderDetail {
            order: new_order(ids::OUTLET_KWR, 1, OrderType::DineIn),
            items: vec![],
            payments: vec![],
        };
        for request in [line(ids::NASI_GORENG, 2, &[ids::MOD_TIDAK_PEDAS]), line(ids::ES_TEH, 2, &[])] {
            let item = snapshot.price_line(&request).unwrap().into_item(&detail.order.id, now);
            detail.add_item(item, now).unwrap();
        }

        let mut tx = db.begin().await.unwrap();
        insert_order(&mut tx, &detail.order).await.unwrap();
        for item in &detail.items {
            insert_item(&mut tx, item).await.unwrap();
        }
        tx.commit().await.unwrap();
        detail
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let db = seeded().await;
        let detail = persisted_detail(&db).await;

        let loaded = db
            .orders()
            .get(ids::OUTLET_KWR, &detail.order.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.order.order_number, detail.order.order_number);
        assert_eq!(loaded.order.total_amount.minor(), 66_000);
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.items[0].product_id, ids::NASI_GORENG);
        assert_eq!(loaded.items[0].modifiers.len(), 1);
        assert_eq!(loaded.items[1].product_id, ids::ES_TEH);
        assert!(loaded.payments.is_empty());
    }

    #[tokio::test]
    async fn test_other_outlet_sees_nothing() {
        let db = seeded().await;
        let detail = persisted_detail(&db).await;

        let found = db.orders().get(ids::OUTLET_SMG, &detail.order.id).await.unwrap();
        assert!(found.is_none());

        let mut conn = db.pool().acquire().await.unwrap();
        let err = lock_order(&mut conn, ids::OUTLET_SMG, &detail.order.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_and_delete_items() {
        let db = seeded().await;
        let mut detail = persisted_detail(&db).await;
        let now = Utc::now();

        let keep_id = detail.items[1].id.clone();
        let drop_id = detail.items[0].id.clone();
        let update = UpdateItemRequest {
            quantity: Some(3),
            notes: Some("less ice".into()),
        };

        let mut tx = db.begin().await.unwrap();
        lock_order(&mut tx, ids::OUTLET_KWR, &detail.order.id).await.unwrap();
        let updated = detail.update_item(&keep_id, &update, now).unwrap().clone();
        update_item(&mut tx, &updated).await.unwrap();
        detail.remove_item(&drop_id, now).unwrap();
        delete_item(&mut tx, &detail.order.id, &drop_id).await.unwrap();
        update_order_header(&mut tx, &detail.order).await.unwrap();
        tx.commit().await.unwrap();

        let loaded = db
            .orders()
            .get(ids::OUTLET_KWR, &detail.order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].quantity, 3);
        assert_eq!(loaded.items[0].notes.as_deref(), Some("less ice"));
        assert_eq!(loaded.order.subtotal.minor(), 24_000);
        assert_eq!(loaded.order.total_amount.minor(), 24_000);

        let orphans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM order_item_modifiers WHERE order_item_id = ?1",
        )
        .bind(&drop_id)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_duplicate_order_number_is_conflict() {
        let db = seeded().await;
        let first = new_order(ids::OUTLET_KWR, 1, OrderType::Takeaway);
        let second = new_order(ids::OUTLET_KWR, 1, OrderType::Takeaway);

        let mut conn = db.pool().acquire().await.unwrap();
        insert_order(&mut conn, &first).await.unwrap();
        let err = insert_order(&mut conn, &second).await.unwrap_err();
        assert!(err.is_conflict(), "{:?}", err);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = seeded().await;
        {
            let mut conn = db.pool().acquire().await.unwrap();

            let open = new_order(ids::OUTLET_KWR, 1, OrderType::DineIn);
            insert_order(&mut conn, &open).await.unwrap();

            let mut done = new_order(ids::OUTLET_KWR, 2, OrderType::Takeaway);
            done.status = OrderStatus::Completed;
            insert_order(&mut conn, &done).await.unwrap();

            let mut booked = new_order(ids::OUTLET_KWR, 3, OrderType::Catering);
            booked.status = OrderStatus::Cancelled;
            booked.catering_status = Some(CateringStatus::Cancelled);
            insert_order(&mut conn, &booked).await.unwrap();

            let elsewhere = new_order(ids::OUTLET_SMG, 1, OrderType::DineIn);
            insert_order(&mut conn, &elsewhere).await.unwrap();
        }

        let repo = db.orders();
        let all = repo
            .list(ids::OUTLET_KWR, &OrderFilter::default(), DEFAULT_LIST_LIMIT)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let active = repo
            .list(
                ids::OUTLET_KWR,
                &OrderFilter {
                    statuses: vec![],
                    active: true,
                },
                DEFAULT_LIST_LIMIT,
            )
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].status, OrderStatus::New);

        let completed = repo
            .list(
                ids::OUTLET_KWR,
                &OrderFilter {
                    statuses: vec![OrderStatus::Completed, OrderStatus::Cancelled],
                    active: false,
                },
                DEFAULT_LIST_LIMIT,
            )
            .await
            .unwrap();
        assert_eq!(completed.len(), 2);
        assert!(completed.iter().all(|o| o.status.is_terminal()));
    }
}
