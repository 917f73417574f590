//! Subscriber-side handles returned by [`EventChannel`](crate::EventChannel).
//!
//! A subscription is a weak association: the channel only holds the sending
//! half of a bounded queue. Dropping the receiving side (or detaching it)
//! ends delivery without the channel owning the subscriber.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bus::ChannelEvent;

/// Identifier assigned to each attached subscriber, unique per channel.
pub type SubscriptionId = u64;

/// Callback invoked once per delivered event.
///
/// Implemented for any `Fn(&ChannelEvent)` closure that is `Send + Sync`.
pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: &ChannelEvent);
}

impl<F> EventHandler for F
where
    F: Fn(&ChannelEvent) + Send + Sync + 'static,
{
    fn handle(&self, event: &ChannelEvent) {
        self(event)
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Pull-style subscription: the caller receives events from a queue.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    event_name: String,
    receiver: mpsc::Receiver<ChannelEvent>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        event_name: String,
        receiver: mpsc::Receiver<ChannelEvent>,
    ) -> Self {
        Self {
            id,
            event_name,
            receiver,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the subscription has been detached (or the
    /// channel closed) and every queued event has been drained.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.receiver.recv().await
    }

    /// Take the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ChannelEvent> {
        self.receiver.try_recv().ok()
    }
}

// ---------------------------------------------------------------------------
// HandlerSubscription
// ---------------------------------------------------------------------------

/// Push-style subscription: a delivery task invokes a handler per event.
///
/// The task ends on its own once the subscription is detached from the
/// channel; [`join`](Self::join) waits for it to drain.
#[derive(Debug)]
pub struct HandlerSubscription {
    id: SubscriptionId,
    event_name: String,
    task: JoinHandle<()>,
}

impl HandlerSubscription {
    /// Spawn the delivery task for `subscription`.
    pub(crate) fn spawn<H: EventHandler>(mut subscription: Subscription, handler: H) -> Self {
        let id = subscription.id;
        let event_name = subscription.event_name.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(&event)));
                if outcome.is_err() {
                    tracing::error!(
                        subscription_id = subscription.id,
                        event_name = %event.name,
                        "Event handler panicked, event dropped"
                    );
                }
            }
            tracing::debug!(subscription_id = subscription.id, "Handler delivery task finished");
        });

        Self {
            id,
            event_name,
            task,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the delivery task to finish after the subscription has been
    /// detached.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(subscription_id = self.id, error = %e, "Handler delivery task failed");
        }
    }

    /// Stop delivering immediately, discarding queued events.
    pub fn abort(&self) {
        self.task.abort();
    }
}
