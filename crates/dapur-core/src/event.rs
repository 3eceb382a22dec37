//! # Domain Events
//!
//! What services emit after a committed mutation, and the envelope the hub
//! delivers to clients.
//!
//! ```text
//!   service ── commit ──► DomainEvent ──► EventPublisher::publish
//!                                              │
//!                                              ▼ (hub stamps sequence + time)
//!                                         OrderEvent ──► outlet subscribers
//! ```
//!
//! Events are notifications only. A client that needs authoritative state
//! re-fetches the order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::types::OrderDetail;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum EventType {
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.updated")]
    OrderUpdated,
    #[serde(rename = "item.updated")]
    ItemUpdated,
    #[serde(rename = "order.paid")]
    OrderPaid,
}

impl EventType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventType::OrderCreated => "order.created",
            EventType::OrderUpdated => "order.updated",
            EventType::ItemUpdated => "item.updated",
            EventType::OrderPaid => "order.paid",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event as emitted by a service: a type plus the committed order snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEvent {
    pub event_type: EventType,
    pub order: OrderDetail,
}

impl DomainEvent {
    pub fn new(event_type: EventType, order: OrderDetail) -> Self {
        DomainEvent { event_type, order }
    }

    pub fn outlet_id(&self) -> &str {
        self.order.outlet_id()
    }
}

/// Wire envelope delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderEvent {
    pub event_type: EventType,
    pub outlet_id: String,
    pub order_id: String,
    /// Per-outlet, strictly increasing.
    pub sequence: u64,
    #[ts(as = "String")]
    pub emitted_at: DateTime<Utc>,
    pub order: OrderDetail,
}

/// Sink for domain events.
///
/// `publish` must not block on slow consumers: it is called right after a
/// commit on the request path, and delivery failures never fail the request.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DomainEvent);
}
