use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use healthmon_core::names::SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED;
use healthmon_core::wire::SignalMessage;
use healthmon_events::{ChannelEvent, EventChannel, Subscription};
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Interval between server-initiated Ping frames.
pub const PING_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP handler that upgrades the connection to a signal stream.
///
/// The subscription is attached before the upgrade response is sent, so a
/// client whose handshake completed receives every event published from
/// then on. If the upgrade never completes the subscription is dropped and
/// pruned on the next publish.
pub async fn signals_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let subscription = state
        .channel
        .attach(SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED)
        .await;
    ws.on_upgrade(move |socket| {
        handle_socket(socket, subscription, state.channel, state.shutdown)
    })
}

/// Manage a single subscriber connection after upgrade.
///
/// Forwards events, answers the client and pings on a timer until either
/// side goes away or the service shuts down. The subscription is detached
/// on every exit path.
async fn handle_socket(
    socket: WebSocket,
    mut subscription: Subscription,
    channel: Arc<EventChannel>,
    shutdown: CancellationToken,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        conn_id = %conn_id,
        subscription_id = subscription.id(),
        "Signal subscriber connected"
    );

    let (mut sink, mut stream) = socket.split();

    let mut ping = tokio::time::interval(PING_INTERVAL);
    // The first tick completes immediately; skip it.
    ping.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            event = subscription.recv() => {
                let Some(event) = event else {
                    // Detached by the channel (service closing).
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                };
                let Some(frame) = encode_signal(event) else {
                    continue;
                };
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    tracing::debug!(conn_id = %conn_id, "WebSocket sink closed");
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Pong(_))) => {
                        tracing::trace!(conn_id = %conn_id, "Pong received");
                    }
                    Some(Ok(_)) => {
                        // Subscribers have nothing to send; ignore.
                    }
                    Some(Err(e)) => {
                        tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                        break;
                    }
                }
            }
            _ = ping.tick() => {
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    channel
        .detach(SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED, subscription.id())
        .await;
    tracing::info!(conn_id = %conn_id, "Signal subscriber disconnected");
}

/// Serialize a channel event into a signal frame.
fn encode_signal(event: ChannelEvent) -> Option<String> {
    let message = SignalMessage::new(event.name, event.payload, event.timestamp);
    match serde_json::to_string(&message) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode signal frame");
            None
        }
    }
}
