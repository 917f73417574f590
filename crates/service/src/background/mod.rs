//! Periodic background loops.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned on a task tracker. All loops accept a [`CancellationToken`] for
//! graceful shutdown; cancellation is checked before every tick, so a loop
//! stops at the top of its next iteration.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod sensor_loop;
pub mod threshold_monitor;

pub use threshold_monitor::ThresholdMonitor;
