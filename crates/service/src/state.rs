use std::sync::Arc;

use healthmon_core::published::PublishedState;
use healthmon_events::EventChannel;
use tokio_util::sync::CancellationToken;

use crate::config::ServiceConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Read-only property view over the live sensor reading.
    pub published: PublishedState,
    /// Event channel the threshold monitor publishes to.
    pub channel: Arc<EventChannel>,
    /// Service configuration.
    pub config: Arc<ServiceConfig>,
    /// Cancelled when the service starts shutting down; long-lived
    /// connections watch it to close promptly.
    pub shutdown: CancellationToken,
}
