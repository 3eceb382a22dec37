//! # HTTP Routes
//!
//! ```text
//! POST   /orders                               create
//! GET    /orders?status=NEW,READY&active=true  list
//! GET    /orders/{id}                          get
//! POST   /orders/{id}/items                    add item
//! PUT    /orders/{id}/items                    diff-save the cart
//! PATCH  /orders/{id}/items/{item_id}          update quantity / notes
//! DELETE /orders/{id}/items/{item_id}          remove item
//! PUT    /orders/{id}/items/{item_id}/status   kitchen status
//! PUT    /orders/{id}/status                   order status
//! POST   /orders/{id}/cancel                   cancel
//! POST   /orders/{id}/payments                 add payment
//! GET    /ws                                   outlet event stream
//! GET    /health                               liveness + database
//! ```
//!
//! Every route except `/health` requires the scope headers.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use dapur_core::diff::DesiredItem;
use dapur_core::{
    CoreError, CreateOrderRequest, ItemStatus, Money, Order, OrderDetail, OrderFilter,
    OrderLineRequest, OrderStatus, Payment, PaymentRequest, UpdateItemRequest,
};

use crate::error::ApiError;
use crate::scope::RequestScope;
use crate::services::payment::PaymentReceipt;
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(event_stream))
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/items", post(add_item).put(save_items))
        .route(
            "/orders/{id}/items/{item_id}",
            axum::routing::patch(update_item).delete(remove_item),
        )
        .route("/orders/{id}/items/{item_id}/status", put(set_item_status))
        .route("/orders/{id}/status", put(transition_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/orders/{id}/payments", post(add_payment))
        .with_state(state)
}

// =============================================================================
// Bodies
// =============================================================================

/// Order detail plus the derived balance.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub detail: OrderDetail,
    pub balance_due: Money,
}

impl From<OrderDetail> for OrderView {
    fn from(detail: OrderDetail) -> Self {
        let balance_due = detail.order.balance_due();
        OrderView {
            detail,
            balance_due,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub payment: Payment,
    pub order: OrderView,
}

impl From<PaymentReceipt> for PaymentView {
    fn from(receipt: PaymentReceipt) -> Self {
        PaymentView {
            payment: receipt.payment,
            order: receipt.order.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Comma-separated statuses, e.g. `NEW,PREPARING`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl ListQuery {
    fn filter(&self) -> ApiResult<OrderFilter> {
        let statuses = match self.status.as_deref() {
            Some(raw) => raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse::<OrderStatus>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ApiError::from(CoreError::from(e)))?,
            None => Vec::new(),
        };
        Ok(OrderFilter {
            statuses,
            active: self.active,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveItemsBody {
    pub items: Vec<DesiredItem>,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusBody {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ItemStatusBody {
    pub status: ItemStatus,
}

// =============================================================================
// Handlers
// =============================================================================

async fn health(State(state): State<AppState>) -> Response {
    let database = state.db.health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = serde_json::json!({
        "status": if database { "ok" } else { "degraded" },
        "database": database,
    });
    (status, Json(body)).into_response()
}

async fn event_stream(State(state): State<AppState>, scope: RequestScope, ws: WebSocketUpgrade) -> Response {
    dapur_hub::ws::upgrade(ws, &state.hub, scope.outlet_id)
}

async fn create_order(
    State(state): State<AppState>,
    scope: RequestScope,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
    let detail = state.orders.create_order(&scope, request).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

async fn list_orders(
    State(state): State<AppState>,
    scope: RequestScope,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    let filter = query.filter()?;
    let orders = state.orders.list_orders(&scope, &filter, query.limit).await?;
    Ok(Json(orders))
}

async fn get_order(
    State(state): State<AppState>,
    scope: RequestScope,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    let detail = state.orders.get_order(&scope, &id).await?;
    Ok(Json(detail.into()))
}

async fn add_item(
    State(state): State<AppState>,
    scope: RequestScope,
    Path(id): Path<String>,
    Json(line): Json<OrderLineRequest>,
) -> ApiResult<Json<OrderView>> {
    let detail = state.orders.add_item(&scope, &id, line).await?;
    Ok(Json(detail.into()))
}

async fn save_items(
    State(state): State<AppState>,
    scope: RequestScope,
    Path(id): Path<String>,
    Json(body): Json<SaveItemsBody>,
) -> ApiResult<Json<OrderView>> {
    let detail = state.orders.save_items(&scope, &id, body.items).await?;
    Ok(Json(detail.into()))
}

async fn update_item(
    State(state): State<AppState>,
    scope: RequestScope,
    Path((id, item_id)): Path<(String, String)>,
    Json(update): Json<UpdateItemRequest>,
) -> ApiResult<Json<OrderView>> {
    let detail = state.orders.update_item(&scope, &id, &item_id, update).await?;
    Ok(Json(detail.into()))
}

async fn remove_item(
    State(state): State<AppState>,
    scope: RequestScope,
    Path((id, item_id)): Path<(String, String)>,
) -> ApiResult<Json<OrderView>> {
    let detail = state.orders.remove_item(&scope, &id, &item_id).await?;
    Ok(Json(detail.into()))
}

async fn set_item_status(
    State(state): State<AppState>,
    scope: RequestScope,
    Path((id, item_id)): Path<(String, String)>,
    Json(body): Json<ItemStatusBody>,
) -> ApiResult<Json<OrderView>> {
    let detail = state
        .orders
        .set_item_status(&scope, &id, &item_id, body.status)
        .await?;
    Ok(Json(detail.into()))
}

async fn transition_order(
    State(state): State<AppState>,
    scope: RequestScope,
    Path(id): Path<String>,
    Json(body): Json<OrderStatusBody>,
) -> ApiResult<Json<OrderView>> {
    let detail = state.orders.transition_order(&scope, &id, body.status).await?;
    Ok(Json(detail.into()))
}

async fn cancel_order(
    State(state): State<AppState>,
    scope: RequestScope,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    let detail = state.orders.cancel_order(&scope, &id).await?;
    Ok(Json(detail.into()))
}

async fn add_payment(
    State(state): State<AppState>,
    scope: RequestScope,
    Path(id): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<(StatusCode, Json<PaymentView>)> {
    let receipt = state.orders.add_payment(&scope, &id, request).await?;
    Ok((StatusCode::CREATED, Json(receipt.into())))
}
