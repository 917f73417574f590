//! Sensor reading and service identity value types.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::names::SERVICE_VERSION;

/// Physically plausible temperature range (degrees Celsius).
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 50.0..=95.0;

/// Core voltage range (volts).
pub const VOLTAGE_RANGE: RangeInclusive<f64> = 1.05..=1.15;

/// Temperature the simulated sensor boots with.
pub const INITIAL_TEMPERATURE: f64 = 65.0;

/// Voltage the simulated sensor boots with.
pub const INITIAL_VOLTAGE: f64 = 1.1;

/// One atomic (temperature, voltage) sample.
///
/// Always taken as a pair: a `SensorReading` never mixes values from two
/// different update ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub temperature: f64,
    pub voltage: f64,
}

impl SensorReading {
    pub fn new(temperature: f64, voltage: f64) -> Self {
        Self {
            temperature,
            voltage,
        }
    }

    /// Clamp both fields into their valid ranges.
    pub fn clamped(self) -> Self {
        Self {
            temperature: self
                .temperature
                .clamp(*TEMPERATURE_RANGE.start(), *TEMPERATURE_RANGE.end()),
            voltage: self
                .voltage
                .clamp(*VOLTAGE_RANGE.start(), *VOLTAGE_RANGE.end()),
        }
    }

    /// Whether both fields lie inside their valid ranges.
    pub fn in_range(&self) -> bool {
        TEMPERATURE_RANGE.contains(&self.temperature) && VOLTAGE_RANGE.contains(&self.voltage)
    }
}

impl Default for SensorReading {
    fn default() -> Self {
        Self::new(INITIAL_TEMPERATURE, INITIAL_VOLTAGE)
    }
}

/// Immutable identity of the running service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub version: String,
}

impl ServiceIdentity {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self::new(SERVICE_VERSION)
    }
}
