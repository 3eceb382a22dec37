//! # Subscriber Registry
//!
//! Per-outlet fan-out with a bounded queue per subscriber.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          EventHub                                       │
//! │                                                                         │
//! │  publish(DomainEvent)                                                  │
//! │       │                                                                 │
//! │       ▼  (registry lock held: stamp sequence, try_send to each queue)  │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │ outlet-kwr  seq=41   sub#1 [■■□□□]   sub#4 [■■■■■] ← full: drop  │  │
//! │  │ outlet-smg  seq=7    sub#2 [□□□□□]                                │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Subscription::recv() ── drained by the WebSocket task (ws.rs)         │
//! │                                                                         │
//! │  publish never awaits: a stalled subscriber fills its own queue and    │
//! │  is disconnected; nobody else waits for it.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! The sequence is stamped and every queue is fed while the registry lock is
//! held, so two concurrent publishers for the same outlet cannot interleave:
//! each subscriber sees events in sequence order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::error::{HubError, HubResult};
use dapur_core::{DomainEvent, EventPublisher, OrderEvent};

// =============================================================================
// Configuration
// =============================================================================

/// Default queue capacity per subscriber.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// Default WebSocket keepalive interval.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Hub settings.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Events a subscriber may have queued before it is disconnected.
    pub subscriber_buffer: usize,
    /// Interval between WebSocket pings.
    pub ping_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }
}

impl HubConfig {
    pub fn validate(&self) -> HubResult<()> {
        if self.subscriber_buffer == 0 {
            return Err(HubError::InvalidConfig(
                "subscriber_buffer must be at least 1".into(),
            ));
        }
        if self.ping_interval.is_zero() {
            return Err(HubError::InvalidConfig(
                "ping_interval must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Registry
// =============================================================================

type EventSender = mpsc::Sender<Arc<OrderEvent>>;

#[derive(Default)]
struct OutletChannel {
    /// Last sequence handed out. Survives subscribers coming and going.
    sequence: u64,
    subscribers: HashMap<u64, EventSender>,
}

struct HubInner {
    config: HubConfig,
    next_subscriber_id: AtomicU64,
    outlets: Mutex<HashMap<String, OutletChannel>>,
}

impl HubInner {
    fn outlets(&self) -> MutexGuard<'_, HashMap<String, OutletChannel>> {
        // Critical sections never panic midway; a poisoned map is still consistent
        self.outlets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn unsubscribe(&self, outlet_id: &str, subscriber_id: u64) {
        let mut outlets = self.outlets();
        if let Some(channel) = outlets.get_mut(outlet_id) {
            if channel.subscribers.remove(&subscriber_id).is_some() {
                debug!(outlet_id = %outlet_id, subscriber_id, "Subscriber removed");
            }
        }
    }
}

/// The Event Notification Hub. Cheap to clone; all clones share one registry.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        EventHub::new(HubConfig::default())
    }
}

impl EventHub {
    pub fn new(config: HubConfig) -> Self {
        EventHub {
            inner: Arc::new(HubInner {
                config,
                next_subscriber_id: AtomicU64::new(1),
                outlets: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// Registers a new subscriber for an outlet.
    ///
    /// The subscriber receives every event published for `outlet_id` after
    /// this call returns, until it is dropped or falls behind.
    pub fn subscribe(&self, outlet_id: impl Into<String>) -> Subscription {
        let outlet_id = outlet_id.into();
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.config.subscriber_buffer.max(1));

        self.inner
            .outlets()
            .entry(outlet_id.clone())
            .or_default()
            .subscribers
            .insert(id, tx);

        debug!(outlet_id = %outlet_id, subscriber_id = id, "Subscriber registered");

        Subscription {
            id,
            outlet_id,
            receiver: rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live subscribers of an outlet.
    pub fn subscriber_count(&self, outlet_id: &str) -> usize {
        self.inner
            .outlets()
            .get(outlet_id)
            .map(|c| c.subscribers.len())
            .unwrap_or(0)
    }

    /// Fans an event out to the outlet's subscribers and returns the
    /// envelope that was delivered.
    pub fn broadcast(&self, event: DomainEvent) -> Arc<OrderEvent> {
        let outlet_id = event.outlet_id().to_string();
        let mut outlets = self.inner.outlets();
        let channel = outlets.entry(outlet_id.clone()).or_default();
        channel.sequence += 1;

        let envelope = Arc::new(OrderEvent {
            event_type: event.event_type,
            order_id: event.order.order.id.clone(),
            outlet_id,
            sequence: channel.sequence,
            emitted_at: Utc::now(),
            order: event.order,
        });

        channel.subscribers.retain(|subscriber_id, tx| {
            match tx.try_send(Arc::clone(&envelope)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        outlet_id = %envelope.outlet_id,
                        subscriber_id = *subscriber_id,
                        sequence = envelope.sequence,
                        "Subscriber queue full, disconnecting"
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(subscriber_id = *subscriber_id, "Pruning closed subscriber");
                    false
                }
            }
        });

        debug!(
            outlet_id = %envelope.outlet_id,
            event_type = %envelope.event_type,
            sequence = envelope.sequence,
            receivers = channel.subscribers.len(),
            "Event published"
        );

        envelope
    }
}

impl EventPublisher for EventHub {
    fn publish(&self, event: DomainEvent) {
        self.broadcast(event);
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// One live subscriber. Dropping it unregisters it from the hub.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    outlet_id: String,
    receiver: mpsc::Receiver<Arc<OrderEvent>>,
    hub: Weak<HubInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn outlet_id(&self) -> &str {
        &self.outlet_id
    }

    /// Next event. `None` once the hub has disconnected this subscriber
    /// (queue overflow) and the remaining queued events are drained.
    pub async fn recv(&mut self) -> Option<Arc<OrderEvent>> {
        self.receiver.recv().await
    }

    /// Next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<OrderEvent>> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(&self.outlet_id, self.id);
        }
    }
}

impl std::fmt::Debug for HubInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubInner").finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dapur_core::{
        EventType, Money, Order, OrderDetail, OrderStatus, OrderType, TaxRate,
    };

    fn detail(outlet_id: &str, order_id: &str) -> OrderDetail {
        let now = Utc::now();
        OrderDetail {
            order: Order {
                id: order_id.into(),
                outlet_id: outlet_id.into(),
                order_number: "KWR-261018-001".into(),
                order_seq: 1,
                business_date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
                order_type: OrderType::DineIn,
                status: OrderStatus::New,
                table_number: None,
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
                catering_status: None,
                catering_dp_amount: None,
                created_by: "cashier-1".into(),
                created_at: now,
                updated_at: now,
                completed_at: None,
            },
            items: vec![],
            payments: vec![],
        }
    }

    pub(crate) fn event(event_type: EventType, outlet_id: &str, order_id: &str) -> DomainEvent {
        DomainEvent::new(event_type, detail(outlet_id, order_id))
    }

    #[tokio::test]
    async fn test_broadcast_is_scoped_to_outlet() {
        let hub = EventHub::default();
        let mut kwr = hub.subscribe("outlet-1");
        let mut smg = hub.subscribe("outlet-2");

        hub.publish(event(EventType::OrderCreated, "outlet-1", "o-1"));

        let received = kwr.recv().await.unwrap();
        assert_eq!(received.outlet_id, "outlet-1");
        assert_eq!(received.order_id, "o-1");
        assert_eq!(received.event_type, EventType::OrderCreated);
        assert!(smg.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_events_arrive_in_sequence_order() {
        let hub = EventHub::default();
        let mut a = hub.subscribe("outlet-1");
        let mut b = hub.subscribe("outlet-1");

        hub.publish(event(EventType::OrderCreated, "outlet-1", "o-1"));
        hub.publish(event(EventType::ItemUpdated, "outlet-1", "o-1"));
        hub.publish(event(EventType::OrderPaid, "outlet-1", "o-1"));

        for sub in [&mut a, &mut b] {
            let seqs: Vec<(u64, EventType)> = vec![
                sub.recv().await.unwrap(),
                sub.recv().await.unwrap(),
                sub.recv().await.unwrap(),
            ]
            .into_iter()
            .map(|e| (e.sequence, e.event_type))
            .collect();
            assert_eq!(
                seqs,
                vec![
                    (1, EventType::OrderCreated),
                    (2, EventType::ItemUpdated),
                    (3, EventType::OrderPaid),
                ]
            );
        }
    }

    #[tokio::test]
    async fn test_sequence_is_per_outlet() {
        let hub = EventHub::default();
        let first = hub.broadcast(event(EventType::OrderCreated, "outlet-1", "o-1"));
        let other = hub.broadcast(event(EventType::OrderCreated, "outlet-2", "o-2"));
        let second = hub.broadcast(event(EventType::OrderUpdated, "outlet-1", "o-1"));

        assert_eq!(first.sequence, 1);
        assert_eq!(other.sequence, 1);
        assert_eq!(second.sequence, 2);
    }

    #[tokio::test]
    async fn test_full_queue_disconnects_only_the_slow_subscriber() {
        let hub = EventHub::new(HubConfig {
            subscriber_buffer: 2,
            ..HubConfig::default()
        });
        let mut slow = hub.subscribe("outlet-1");
        let mut fast = hub.subscribe("outlet-1");

        for i in 0..3 {
            hub.publish(event(EventType::OrderUpdated, "outlet-1", "o-1"));
            // fast keeps up
            let e = fast.recv().await.unwrap();
            assert_eq!(e.sequence, i + 1);
        }

        assert_eq!(hub.subscriber_count("outlet-1"), 1);

        // slow drains what was queued before the overflow, then sees the end
        assert_eq!(slow.recv().await.unwrap().sequence, 1);
        assert_eq!(slow.recv().await.unwrap().sequence, 2);
        assert!(slow.recv().await.is_none());

        hub.publish(event(EventType::OrderPaid, "outlet-1", "o-1"));
        assert_eq!(fast.recv().await.unwrap().sequence, 4);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let hub = EventHub::default();
        let sub = hub.subscribe("outlet-1");
        let _other = hub.subscribe("outlet-1");
        assert_eq!(hub.subscriber_count("outlet-1"), 2);

        drop(sub);
        assert_eq!(hub.subscriber_count("outlet-1"), 1);
        assert_eq!(hub.subscriber_count("outlet-9"), 0);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_a_no_op() {
        let hub = EventHub::default();
        let publisher: &dyn EventPublisher = &hub;
        publisher.publish(event(EventType::OrderCreated, "outlet-1", "o-1"));

        // later subscribers do not see earlier events
        let mut late = hub.subscribe("outlet-1");
        assert!(late.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_publishers_keep_each_subscriber_ordered() {
        let hub = EventHub::new(HubConfig {
            subscriber_buffer: 1_000,
            ..HubConfig::default()
        });
        let mut sub = hub.subscribe("outlet-1");

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let hub = hub.clone();
                tokio::spawn(async move {
                    for _ in 0..50 {
                        hub.publish(event(EventType::OrderUpdated, "outlet-1", "o-1"));
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut last = 0;
        for _ in 0..400 {
            let e = sub.recv().await.unwrap();
            assert_eq!(e.sequence, last + 1);
            last = e.sequence;
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(HubConfig::default().validate().is_ok());
        let bad = HubConfig {
            subscriber_buffer: 0,
            ..HubConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
