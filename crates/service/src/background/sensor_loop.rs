//! Sensor simulation loop.
//!
//! Advances the [`SensorSource`] once per period. The source's lock is held
//! only inside [`SensorSource::update`], never across the wait between ticks.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use healthmon_core::sensor::SensorSource;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the sensor update loop until `cancel` is triggered.
///
/// The first update happens immediately. A tick whose update panics is
/// logged and skipped; the loop carries on with the next period. When the
/// loop exits, readers keep seeing the last stored reading.
pub async fn run(mut source: SensorSource, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_ms = interval.as_millis() as u64,
        "Sensor simulation loop started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Sensor simulation loop stopping");
                break;
            }
            _ = ticker.tick() => {
                match catch_unwind(AssertUnwindSafe(|| source.update())) {
                    Ok(reading) => {
                        tracing::trace!(
                            temperature = reading.temperature,
                            voltage = reading.voltage,
                            "Sensor updated"
                        );
                    }
                    Err(_) => {
                        tracing::error!("Sensor update panicked, tick skipped");
                    }
                }
            }
        }
    }
}
