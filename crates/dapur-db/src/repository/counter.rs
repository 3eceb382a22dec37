//! # Order Counter
//!
//! Per-outlet, per-business-day sequence for order numbers.
//!
//! ```text
//!   creation tx ──► UPSERT order_counters (outlet, day) ──► last_value
//!                   (first write of the tx: takes the writer lock, so
//!                    concurrent creations are serialized here)
//! ```
//!
//! A rolled-back creation also rolls back its increment; numbers within a
//! day are gap-free for committed orders.

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::error::DbResult;

/// Increments and returns the sequence for `(outlet_id, business_date)`.
/// The first order of a day gets 1.
pub async fn next_order_seq(
    conn: &mut SqliteConnection,
    outlet_id: &str,
    business_date: NaiveDate,
) -> DbResult<i64> {
    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO order_counters (outlet_id, business_date, last_value)
        VALUES (?1, ?2, 1)
        ON CONFLICT (outlet_id, business_date)
        DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(outlet_id)
    .bind(business_date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(seq)
}
