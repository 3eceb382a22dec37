//! # Order Creation
//!
//! ```text
//! CreateOrderRequest
//!      │
//!      ├─ field checks (empty cart, quantities, notes, discount)
//!      ├─ outlet + catalog snapshot (pool reads)
//!      ├─ price every line  ─► UnknownProduct / VariantMismatch /
//!      │                       ModifierConstraintViolated
//!      ├─ catering fields   ─► MissingCateringFields
//!      ▼
//!  BEGIN
//!      ├─ next_order_seq(outlet, business day)   first write, holds the lock
//!      ├─ insert header, items, modifiers
//!  COMMIT ─► order.created
//! ```
//!
//! Prices are frozen onto the items here. Nothing re-reads the catalog for
//! an existing item afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use dapur_core::catalog::Outlet;
use dapur_core::numbering::{business_date, format_order_number};
use dapur_core::order::normalize_notes;
use dapur_core::validation::{validate_catering_fields, validate_create_request};
use dapur_core::{
    CateringStatus, CoreResult, CreateOrderRequest, EventType, Money, Order, OrderDetail, OrderItem,
    OrderStatus, OrderType,
};
use dapur_db::repository::{counter, order};

use super::{retry_on_conflict, OrderService};
use crate::error::{ServiceError, ServiceResult};
use crate::scope::RequestScope;

impl OrderService {
    /// Creates an order with frozen prices and the next number of the day.
    pub async fn create_order(
        &self,
        scope: &RequestScope,
        request: CreateOrderRequest,
    ) -> ServiceResult<OrderDetail> {
        validate_create_request(&request)?;

        let catalog = self.db.catalog();
        let outlet = catalog
            .outlet(&scope.outlet_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Outlet", &scope.outlet_id))?;

        let product_ids: Vec<&str> = request.items.iter().map(|l| l.product_id.as_str()).collect();
        let snapshot = catalog.resolve(&product_ids).await?;

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();
        let items = request
            .items
            .iter()
            .map(|line| snapshot.price_line(line).map(|p| p.into_item(&order_id, now)))
            .collect::<CoreResult<Vec<OrderItem>>>()?;
        validate_catering_fields(&request)?;

        let draft = Draft {
            order_id: &order_id,
            outlet: &outlet,
            scope,
            request: &request,
            items: &items,
            now,
        };
        let draft = &draft;
        let detail = retry_on_conflict("create_order", move || self.insert_draft(draft)).await?;

        info!(
            order_id = %detail.order.id,
            outlet_id = %detail.order.outlet_id,
            order_number = %detail.order.order_number,
            total = %detail.order.total_amount,
            "Order created"
        );
        self.publish(EventType::OrderCreated, &detail);
        Ok(detail)
    }

    async fn insert_draft(&self, draft: &Draft<'_>) -> ServiceResult<OrderDetail> {
        let date = business_date(draft.now, self.settings.utc_offset_minutes);
        let prefix = draft
            .outlet
            .order_prefix
            .as_deref()
            .unwrap_or(&self.settings.default_prefix);

        let mut tx = self.db.begin().await?;
        let seq = counter::next_order_seq(&mut tx, &draft.outlet.id, date).await?;
        let order_number = format_order_number(prefix, date, seq);
        debug!(order_number = %order_number, "Assigned order number");

        let mut detail = OrderDetail {
            order: draft.header(order_number, seq, date),
            items: draft.items.to_vec(),
            payments: Vec::new(),
        };
        detail.recalculate(draft.now);

        order::insert_order(&mut tx, &detail.order).await?;
        for item in &detail.items {
            order::insert_item(&mut tx, item).await?;
        }

        let detail = order::require_detail(&mut tx, &draft.outlet.id, draft.order_id).await?;
        tx.commit().await?;
        Ok(detail)
    }
}

/// Everything about a new order that does not depend on its number.
struct Draft<'a> {
    order_id: &'a str,
    outlet: &'a Outlet,
    scope: &'a RequestScope,
    request: &'a CreateOrderRequest,
    items: &'a [OrderItem],
    now: DateTime<Utc>,
}

impl Draft<'_> {
    fn header(&self, order_number: String, order_seq: i64, business_date: NaiveDate) -> Order {
        let request = self.request;
        let catering = request.order_type == OrderType::Catering;
        let text = |v: &Option<String>| v.as_deref().and_then(normalize_notes);

        Order {
            id: self.order_id.to_string(),
            outlet_id: self.outlet.id.clone(),
            order_number,
            order_seq,
            business_date,
            order_type: request.order_type,
            status: OrderStatus::New,
            table_number: text(&request.table_number),
            customer_id: text(&request.customer_id),
            customer_name: text(&request.customer_name),
            notes: text(&request.notes),
            subtotal: Money::zero(),
            discount_type: request.discount.map(|d| d.discount_type),
            discount_value: request.discount.map(|d| d.value).unwrap_or(0),
            discount_amount: Money::zero(),
            tax_rate: self.outlet.tax_rate,
            tax_amount: Money::zero(),
            total_amount: Money::zero(),
            amount_paid: Money::zero(),
            catering_date: if catering { request.catering_date } else { None },
            catering_status: catering.then_some(CateringStatus::Booked),
            catering_dp_amount: None,
            created_by: self.scope.actor_id.clone(),
            created_at: self.now,
            updated_at: self.now,
            completed_at: None,
        }
    }
}
