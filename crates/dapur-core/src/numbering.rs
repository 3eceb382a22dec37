//! # Order Numbering
//!
//! Pure helpers for the per-outlet, per-business-day order number. The
//! counter itself lives in the database (`order_counters`) and is bumped in
//! the same transaction that inserts the order.
//!
//! ```text
//!   KWR - 261018 - 007
//!   ─┬─   ──┬───   ─┬─
//!    │      │       └── sequence within the business day (≥ 3 digits)
//!    │      └────────── business date, YYMMDD
//!    └───────────────── outlet prefix
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Calendar day the outlet is trading in at `now`.
///
/// `utc_offset_minutes` shifts UTC to outlet local time (WIB = +420).
pub fn business_date(now: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    (now + Duration::minutes(i64::from(utc_offset_minutes))).date_naive()
}

/// Formats an order number.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use dapur_core::numbering::format_order_number;
///
/// let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
/// assert_eq!(format_order_number("KWR", date, 1), "KWR-261018-001");
/// ```
pub fn format_order_number(prefix: &str, date: NaiveDate, seq: i64) -> String {
    format!("{}-{}-{:03}", prefix, date.format("%y%m%d"), seq)
}
