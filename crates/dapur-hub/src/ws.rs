//! # WebSocket Delivery
//!
//! Drains one [`Subscription`] into one WebSocket.
//!
//! ```text
//!   Subscription ──recv()──► JSON text frame ──► client
//!        │                                         │
//!        │ None (hub dropped us) ──► Close frame   │ Close / error ──► return
//!        │                                         │ (Subscription dropped →
//!   ping every N seconds ───────────► Ping frame   │  unregistered)
//! ```
//!
//! Clients only listen; text frames they send are ignored.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::HubResult;
use crate::registry::{EventHub, Subscription};
use dapur_core::OrderEvent;

/// Maximum inbound message size. Clients have nothing to say.
const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Close code sent when the hub disconnected a lagging subscriber.
const CLOSE_CODE_LAGGING: u16 = 4008;

/// Upgrades the request and streams the outlet's events over the socket.
///
/// The subscription is taken before the upgrade completes so no event
/// published after this call is missed.
pub fn upgrade(ws: WebSocketUpgrade, hub: &EventHub, outlet_id: String) -> Response {
    let subscription = hub.subscribe(outlet_id);
    let ping_interval = hub.config().ping_interval;
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| serve(socket, subscription, ping_interval))
}

/// Runs until the client leaves, the socket breaks, or the hub drops the
/// subscription.
pub async fn serve(socket: WebSocket, mut subscription: Subscription, ping_interval: Duration) {
    let outlet_id = subscription.outlet_id().to_string();
    let subscriber_id = subscription.id();
    info!(outlet_id = %outlet_id, subscriber_id, "Event stream opened");

    let (mut sender, mut receiver) = socket.split();
    let mut ping = interval(ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick fires immediately
    ping.tick().await;

    loop {
        tokio::select! {
            event = subscription.recv() => match event {
                Some(event) => {
                    if let Err(e) = send_event(&mut sender, &event).await {
                        debug!(subscriber_id, ?e, "Send failed, closing stream");
                        break;
                    }
                }
                None => {
                    warn!(outlet_id = %outlet_id, subscriber_id, "Subscriber dropped by hub");
                    let close = Message::Close(Some(CloseFrame {
                        code: CLOSE_CODE_LAGGING,
                        reason: "lagging".into(),
                    }));
                    let _ = sender.send(close).await;
                    break;
                }
            },
            _ = ping.tick() => {
                if sender.send(Message::Ping(axum::body::Bytes::new())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Ping(data))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(subscriber_id, ?e, "WebSocket error");
                    break;
                }
            },
        }
    }

    info!(outlet_id = %outlet_id, subscriber_id, "Event stream closed");
}

async fn send_event(sender: &mut SplitSink<WebSocket, Message>, event: &OrderEvent) -> HubResult<()> {
    let json = serde_json::to_string(event)?;
    sender.send(Message::Text(json.into())).await?;
    Ok(())
}
