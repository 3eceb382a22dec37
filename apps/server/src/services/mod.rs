//! # Order Services
//!
//! One method per exposed operation. Each runs as one database transaction
//! and publishes its events only after the commit succeeded.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Mutation Lifecycle                                   │
//! │                                                                         │
//! │  catalog reads (pool)         only for create / add item / diff-save   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├─ first write takes the lock                                         │
//! │   │    create:   order_counters upsert                                  │
//! │   │    existing: lock_order (no-op UPDATE on the order row)             │
//! │   ├─ read fresh state, apply dapur-core rules                           │
//! │   ├─ persist header / items / payments                                  │
//! │   └─ re-read the committed snapshot                                     │
//! │  COMMIT ──► info! log ──► EventPublisher::publish                       │
//! │                                                                         │
//! │  Conflict (unique / busy) ──► whole attempt retried once ──► 409        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`create`] - Order creation with numbering
//! - [`edit`] - Add / update / remove items and bulk diff-save
//! - [`payment`] - Payment reconciliation
//! - [`status`] - Order and item status transitions, cancellation
//! - [`query`] - Get and list

pub mod create;
pub mod edit;
pub mod payment;
pub mod query;
pub mod status;

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use dapur_core::{DomainEvent, EventPublisher, EventType, OrderDetail, DEFAULT_ORDER_PREFIX};
use dapur_db::Database;

use crate::error::ServiceResult;

/// Order-related settings from `[orders]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSettings {
    /// Shift from UTC to outlet local time for the business day.
    pub utc_offset_minutes: i32,
    /// Order-number prefix for outlets without one.
    pub default_prefix: String,
}

impl Default for OrderSettings {
    fn default() -> Self {
        OrderSettings {
            utc_offset_minutes: 420,
            default_prefix: DEFAULT_ORDER_PREFIX.to_string(),
        }
    }
}

/// Entry point for every order operation.
pub struct OrderService {
    db: Database,
    publisher: Arc<dyn EventPublisher>,
    settings: OrderSettings,
}

impl OrderService {
    pub fn new(db: Database, publisher: Arc<dyn EventPublisher>, settings: OrderSettings) -> Self {
        OrderService {
            db,
            publisher,
            settings,
        }
    }

    pub fn settings(&self) -> &OrderSettings {
        &self.settings
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn publish(&self, event_type: EventType, detail: &OrderDetail) {
        self.publisher.publish(DomainEvent::new(event_type, detail.clone()));
    }
}

/// Runs `attempt` and, if it lost a race with a concurrent writer, runs it
/// exactly once more. A second conflict is returned to the caller.
async fn retry_on_conflict<T, F, Fut>(operation: &'static str, mut attempt: F) -> ServiceResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ServiceResult<T>>,
{
    match attempt().await {
        Err(err) if err.is_conflict() => {
            warn!(operation, error = %err, "Write conflict, retrying once");
            attempt().await
        }
        other => other,
    }
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use dapur_core::OrderLineRequest;
    use dapur_db::seed::{self, ids};
    use dapur_db::DbConfig;

    use crate::error::ServiceError;
    use crate::scope::RequestScope;

    /// Publisher that records every event.
    #[derive(Default)]
    pub(crate) struct RecordingPublisher {
        events: Mutex<Vec<DomainEvent>>,
    }

    impl RecordingPublisher {
        pub(crate) fn types(&self) -> Vec<EventType> {
            self.events().iter().map(|e| e.event_type).collect()
        }

        pub(crate) fn events(&self) -> Vec<DomainEvent> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }

        pub(crate) fn clear(&self) {
            if let Ok(mut events) = self.events.lock() {
                events.clear();
            }
        }
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, event: DomainEvent) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
        }
    }

    pub(crate) async fn service() -> (OrderService, Arc<RecordingPublisher>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed::seed_demo_data(db.pool()).await.unwrap();
        service_with(db)
    }

    pub(crate) fn service_with(db: Database) -> (OrderService, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::default());
        let service = OrderService::new(db, publisher.clone(), OrderSettings::default());
        (service, publisher)
    }

    pub(crate) fn kwr() -> RequestScope {
        RequestScope::new(ids::OUTLET_KWR, "cashier-01")
    }

    pub(crate) fn smg() -> RequestScope {
        RequestScope::new(ids::OUTLET_SMG, "cashier-02")
    }

    pub(crate) fn line(product_id: &str, quantity: i64, modifier_ids: &[&str]) -> OrderLineRequest {
        OrderLineRequest {
            product_id: product_id.to_string(),
            variant_id: None,
            quantity,
            modifier_ids: modifier_ids.iter().map(|m| m.to_string()).collect(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_retry_runs_twice_on_conflict_only() {
        let mut calls = 0;
        let result: ServiceResult<()> = retry_on_conflict("test", || {
            calls += 1;
            async { Err(ServiceError::Conflict("busy".into())) }
        })
        .await;
        assert!(result.unwrap_err().is_conflict());
        assert_eq!(calls, 2);

        let mut calls = 0;
        let result: ServiceResult<()> = retry_on_conflict("test", || {
            calls += 1;
            async { Err(ServiceError::not_found("Order", "x")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 1);

        let mut calls = 0;
        let result = retry_on_conflict("test", || {
            calls += 1;
            let attempt = calls;
            async move {
                if attempt == 1 {
                    Err(ServiceError::Conflict("unique".into()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
    }
}
