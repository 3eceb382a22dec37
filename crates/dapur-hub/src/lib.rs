//! # dapur-hub: Event Notification Hub
//!
//! Delivers committed order events to the live clients of an outlet.
//!
//! ```text
//!   order services ──publish──► EventHub ──► outlet-kwr subscribers ──► /ws
//!                                        └─► outlet-smg subscribers ──► /ws
//! ```
//!
//! Delivery is best-effort and ordered per subscriber. There is no replay:
//! a client that reconnects re-fetches current state through the query API.
//!
//! - [`registry`] - Subscriber registry, bounded queues, sequence stamping
//! - [`ws`] - WebSocket endpoint that drains a subscription
//! - [`error`] - Hub error types

pub mod error;
pub mod registry;
pub mod ws;

pub use error::{HubError, HubResult};
pub use registry::{EventHub, HubConfig, Subscription, DEFAULT_SUBSCRIBER_BUFFER};
