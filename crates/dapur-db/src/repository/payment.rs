//! # Payment Repository
//!
//! Payments are append-only: rows are inserted, never updated or deleted.
//! The running `orders.amount_paid` is maintained by the payment service in
//! the same transaction as the insert.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use dapur_core::{Money, Payment, PaymentMethod, PaymentStatus};

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: String,
    order_id: String,
    payment_method: PaymentMethod,
    amount: i64,
    status: PaymentStatus,
    reference_number: Option<String>,
    amount_received: Option<i64>,
    change_amount: Option<i64>,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(r: PaymentRow) -> Self {
        Payment {
            id: r.id,
            order_id: r.order_id,
            payment_method: r.payment_method,
            amount: Money::from_minor(r.amount),
            status: r.status,
            reference_number: r.reference_number,
            amount_received: r.amount_received.map(Money::from_minor),
            change_amount: r.change_amount.map(Money::from_minor),
            created_by: r.created_by,
            created_at: r.created_at,
        }
    }
}

/// Records a payment.
pub async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    debug!(
        order_id = %payment.order_id,
        method = %payment.payment_method,
        amount = payment.amount.minor(),
        "Inserting payment"
    );

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, order_id, payment_method, amount, status, reference_number,
            amount_received, change_amount, created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.order_id)
    .bind(payment.payment_method)
    .bind(payment.amount.minor())
    .bind(payment.status)
    .bind(&payment.reference_number)
    .bind(payment.amount_received.map(|m| m.minor()))
    .bind(payment.change_amount.map(|m| m.minor()))
    .bind(&payment.created_by)
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Gets all payments of an order in the order they were taken.
pub async fn fetch_payments(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<Payment>> {
    let rows: Vec<PaymentRow> = sqlx::query_as(
        r#"
        SELECT id, order_id, payment_method, amount, status, reference_number,
               amount_received, change_amount, created_by, created_at
        FROM payments
        WHERE order_id = ?1
        ORDER BY created_at, rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Payment::from).collect())
}

/// Sum of COMPLETED payments of an order.
pub async fn completed_total(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Money> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE order_id = ?1 AND status = 'COMPLETED'",
    )
    .bind(order_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_minor(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::order::tests::{persisted_detail, seeded};
    use uuid::Uuid;

    fn payment(order_id: &str, method: PaymentMethod, amount: i64, status: PaymentStatus) -> Payment {
        Payment {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            payment_method: method,
            amount: Money::from_minor(amount),
            status,
            reference_number: None,
            amount_received: None,
            change_amount: None,
            created_by: "cashier-1".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_sum_completed() {
        let db = seeded().await;
        let detail = persisted_detail(&db).await;
        let order_id = detail.order.id.as_str();

        let mut conn = db.pool().acquire().await.unwrap();
        let mut cash = payment(order_id, PaymentMethod::Cash, 50_000, PaymentStatus::Completed);
        cash.amount_received = Some(Money::from_minor(50_000));
        cash.change_amount = Some(Money::zero());
        insert_payment(&mut conn, &cash).await.unwrap();
        insert_payment(
            &mut conn,
            &payment(order_id, PaymentMethod::Qris, 10_000, PaymentStatus::Failed),
        )
        .await
        .unwrap();

        assert_eq!(completed_total(&mut conn, order_id).await.unwrap().minor(), 50_000);

        let payments = fetch_payments(&mut conn, order_id).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].payment_method, PaymentMethod::Cash);
        assert_eq!(payments[0].change_amount, Some(Money::zero()));
    }

    #[tokio::test]
    async fn test_no_payments_sums_to_zero() {
        let db = seeded().await;
        let mut conn = db.pool().acquire().await.unwrap();
        assert!(completed_total(&mut conn, "missing").await.unwrap().is_zero());
    }
}
