//! Rising-edge threshold detection.
//!
//! Pure logic: the caller samples the sensor and feeds each value to
//! [`ThresholdState::observe`]. The state keeps exactly one value of history
//! (the previous sample) and reports a [`ThresholdEvent`] only on the tick
//! where the value goes from at-or-below the threshold to strictly above it.
//! Staying above the threshold never re-fires; dropping back to or below it
//! re-arms the detector silently.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Critical temperature in degrees Celsius. Equality does not count as
/// exceeding it.
pub const TEMPERATURE_THRESHOLD: f64 = 85.0;

/// Value assumed for the sample before the first observation.
pub const INITIAL_LAST_READING: f64 = 0.0;

/// `true` exactly when `previous <= threshold < current`.
pub fn is_rising_edge(previous: f64, current: f64, threshold: f64) -> bool {
    previous <= threshold && current > threshold
}

/// Edge-detection state owned by the threshold monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdState {
    last_reading: f64,
    threshold: f64,
}

impl ThresholdState {
    pub fn new(threshold: f64) -> Self {
        Self {
            last_reading: INITIAL_LAST_READING,
            threshold,
        }
    }

    /// Compare `current` against the previous sample, then remember it.
    ///
    /// Returns the event to publish when this sample is a rising edge.
    pub fn observe(&mut self, current: f64) -> Option<ThresholdEvent> {
        let crossed = is_rising_edge(self.last_reading, current, self.threshold);
        self.last_reading = current;
        crossed.then(|| ThresholdEvent::new(current))
    }

    pub fn last_reading(&self) -> f64 {
        self.last_reading
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether the last observed sample was above the threshold.
    pub fn is_alerting(&self) -> bool {
        self.last_reading > self.threshold
    }
}

impl Default for ThresholdState {
    fn default() -> Self {
        Self::new(TEMPERATURE_THRESHOLD)
    }
}

// ---------------------------------------------------------------------------
// ThresholdEvent
// ---------------------------------------------------------------------------

/// Payload of the `TemperatureThresholdExceeded` signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEvent {
    pub current_temp: f64,
}

impl ThresholdEvent {
    pub fn new(current_temp: f64) -> Self {
        Self { current_temp }
    }

    /// Encode as the JSON payload carried by the event channel.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({ "current_temp": self.current_temp })
    }

    /// Decode a received payload.
    ///
    /// Anything other than an object with a numeric `current_temp` is
    /// rejected as [`CoreError::MalformedEvent`].
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, CoreError> {
        payload
            .get("current_temp")
            .and_then(serde_json::Value::as_f64)
            .map(Self::new)
            .ok_or_else(|| {
                CoreError::MalformedEvent(format!(
                    "expected {{\"current_temp\": <number>}}, got {payload}"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
