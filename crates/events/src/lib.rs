//! In-process publish/subscribe for health monitor events.
//!
//! - [`EventChannel`] -- named observer registry with explicit attach and
//!   detach, delivering each published event to every subscriber attached
//!   at publish time.
//! - [`ChannelEvent`] -- the named event envelope.
//! - [`EventHandler`] -- callback invoked once per delivered event.

pub mod bus;
pub mod subscription;

pub use bus::{ChannelEvent, EventChannel, DEFAULT_CAPACITY};
pub use subscription::{EventHandler, HandlerSubscription, Subscription, SubscriptionId};
