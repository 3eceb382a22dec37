//! Shared application state handed to every handler.

use std::sync::Arc;

use dapur_core::EventPublisher;
use dapur_db::Database;
use dapur_hub::EventHub;

use crate::services::{OrderService, OrderSettings};

/// Cloned into each request by axum. Every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub hub: EventHub,
    pub db: Database,
}

impl AppState {
    /// Wires the order service to publish into `hub`.
    pub fn new(db: Database, hub: EventHub, settings: OrderSettings) -> Self {
        let publisher: Arc<dyn EventPublisher> = Arc::new(hub.clone());
        let orders = Arc::new(OrderService::new(db.clone(), publisher, settings));
        AppState { orders, hub, db }
    }
}
