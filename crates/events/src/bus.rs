//! Named observer registry with best-effort fan-out.
//!
//! [`EventChannel`] maps an event name to the ordered list of subscribers
//! currently attached to it. Publishing hands a copy of the event to each of
//! them through a bounded per-subscriber queue with `try_send`, so a slow or
//! vanished subscriber can never block the publisher:
//!
//! - a full queue drops the event for that subscriber only;
//! - a closed queue (subscriber gone) is pruned from the registry.
//!
//! There is no replay: a subscriber only sees events published after it
//! attached. Publishing to a name with no subscribers is a silent no-op.
//! It is designed to be shared via `Arc<EventChannel>`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

use crate::subscription::{EventHandler, HandlerSubscription, Subscription, SubscriptionId};

// ---------------------------------------------------------------------------
// ChannelEvent
// ---------------------------------------------------------------------------

/// A named event with a JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEvent {
    /// Event name, e.g. `"TemperatureThresholdExceeded"`.
    pub name: String,

    /// Event-specific data.
    pub payload: serde_json::Value,

    /// When the event was published (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ChannelEvent {
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventChannel
// ---------------------------------------------------------------------------

/// Default per-subscriber queue capacity.
pub const DEFAULT_CAPACITY: usize = 64;

struct Registration {
    id: SubscriptionId,
    sender: mpsc::Sender<ChannelEvent>,
}

/// In-process pub/sub hub keyed by event name.
pub struct EventChannel {
    registry: RwLock<HashMap<String, Vec<Registration>>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl EventChannel {
    /// Create a channel whose subscribers each buffer up to `capacity`
    /// undelivered events (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Attach a pull-style subscriber to `event_name`.
    pub async fn attach(&self, event_name: &str) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.capacity);

        self.registry
            .write()
            .await
            .entry(event_name.to_string())
            .or_default()
            .push(Registration { id, sender });

        tracing::debug!(subscription_id = id, event_name, "Subscriber attached");
        Subscription::new(id, event_name.to_string(), receiver)
    }

    /// Attach `handler` to `event_name`.
    ///
    /// The handler runs on its own delivery task, once per event, in publish
    /// order. Must be called from within a Tokio runtime.
    pub async fn subscribe<H: EventHandler>(
        &self,
        event_name: &str,
        handler: H,
    ) -> HandlerSubscription {
        let subscription = self.attach(event_name).await;
        HandlerSubscription::spawn(subscription, handler)
    }

    /// Detach a subscriber. Events already queued for it are still
    /// delivered; nothing published afterwards is.
    ///
    /// Returns `false` if no such subscriber was attached.
    pub async fn detach(&self, event_name: &str, id: SubscriptionId) -> bool {
        let mut registry = self.registry.write().await;
        let Some(registrations) = registry.get_mut(event_name) else {
            return false;
        };

        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;

        if registrations.is_empty() {
            registry.remove(event_name);
        }
        if removed {
            tracing::debug!(subscription_id = id, event_name, "Subscriber detached");
        }
        removed
    }

    /// Publish an event to every subscriber currently attached to
    /// `event_name`.
    ///
    /// Returns the number of subscribers the event was queued for. Zero
    /// subscribers is not an error.
    pub async fn publish(&self, event_name: &str, payload: serde_json::Value) -> usize {
        let event = ChannelEvent::new(event_name, payload);
        let mut registry = self.registry.write().await;

        let Some(registrations) = registry.get_mut(event_name) else {
            tracing::trace!(event_name, "Published with no subscribers");
            return 0;
        };

        let mut delivered = 0;
        registrations.retain(|r| match r.sender.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    subscription_id = r.id,
                    event_name,
                    "Subscriber queue full, event dropped for this subscriber"
                );
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(subscription_id = r.id, event_name, "Pruning closed subscriber");
                false
            }
        });

        if registrations.is_empty() {
            registry.remove(event_name);
        }
        delivered
    }

    /// Number of subscribers attached to `event_name`.
    ///
    /// Subscribers that went away are counted until the next publish prunes
    /// them.
    pub async fn subscriber_count(&self, event_name: &str) -> usize {
        self.registry
            .read()
            .await
            .get(event_name)
            .map_or(0, Vec::len)
    }

    /// Detach every subscriber. Pull subscriptions drain and then yield
    /// `None`; handler delivery tasks finish.
    ///
    /// Returns how many subscribers were detached.
    pub async fn close(&self) -> usize {
        let mut registry = self.registry.write().await;
        let count: usize = registry.values().map(Vec::len).sum();
        registry.clear();
        tracing::info!(count, "Event channel closed");
        count
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
