//! WebSocket signal stream.
//!
//! Each connection on `/api/v1/signals` is one subscriber of the
//! `TemperatureThresholdExceeded` event for as long as it stays open.

mod handler;

pub use handler::{signals_handler, PING_INTERVAL};
