//! Periodic threshold evaluation.
//!
//! [`ThresholdMonitor`] samples the shared sensor reading on its own period,
//! feeds the temperature to a [`ThresholdState`], and publishes a
//! `TemperatureThresholdExceeded` event on the rising edge. The sensor lock
//! is released before publishing: the event carries the value just read.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use healthmon_core::names::SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED;
use healthmon_core::sensor::SharedReading;
use healthmon_core::threshold::{ThresholdEvent, ThresholdState};
use healthmon_events::EventChannel;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Edge-triggered temperature watcher.
pub struct ThresholdMonitor {
    reading: SharedReading,
    state: ThresholdState,
    channel: Arc<EventChannel>,
}

impl ThresholdMonitor {
    /// Monitor against the standard 85.0 C threshold.
    pub fn new(reading: SharedReading, channel: Arc<EventChannel>) -> Self {
        Self::with_state(reading, channel, ThresholdState::default())
    }

    pub fn with_state(
        reading: SharedReading,
        channel: Arc<EventChannel>,
        state: ThresholdState,
    ) -> Self {
        Self {
            reading,
            state,
            channel,
        }
    }

    /// Evaluate one sample.
    ///
    /// Returns the event if this sample was a rising edge. Delivery is
    /// best-effort: having no subscribers is not an error.
    pub async fn tick(&mut self) -> Option<ThresholdEvent> {
        let current = self.reading.read().temperature;
        let event = self.state.observe(current)?;

        tracing::warn!(
            current_temp = event.current_temp,
            threshold = self.state.threshold(),
            "Temperature threshold exceeded"
        );

        let delivered = self
            .channel
            .publish(SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED, event.to_payload())
            .await;
        tracing::debug!(delivered, "Threshold event published");

        Some(event)
    }

    pub fn state(&self) -> &ThresholdState {
        &self.state
    }

    /// Run the evaluation loop until `cancel` is triggered.
    ///
    /// The first evaluation happens immediately. A tick that panics is
    /// logged and skipped.
    pub async fn run(mut self, interval: Duration, cancel: CancellationToken) {
        tracing::info!(
            interval_ms = interval.as_millis() as u64,
            threshold = self.state.threshold(),
            "Threshold monitor started"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Threshold monitor stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if AssertUnwindSafe(self.tick()).catch_unwind().await.is_err() {
                        tracing::error!("Threshold evaluation panicked, tick skipped");
                    }
                }
            }
        }
    }
}
