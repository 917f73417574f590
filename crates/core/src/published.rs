//! Externally readable property view.
//!
//! [`PublishedState`] does no caching: every property access goes straight
//! to the sensor handle. Two separate property reads may therefore observe
//! different ticks; only [`PublishedState::snapshot`] guarantees that
//! temperature and voltage come from the same one.

use serde::{Deserialize, Serialize};

use crate::names::{PROP_TEMPERATURE, PROP_VERSION, PROP_VOLTAGE};
use crate::reading::ServiceIdentity;
use crate::sensor::SharedReading;

/// A single property value as exposed to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Double(f64),
    Str(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            PropertyValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            PropertyValue::Double(_) => None,
        }
    }
}

/// All three properties, with temperature and voltage from one read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertySnapshot {
    pub temperature: f64,
    pub voltage: f64,
    pub version: String,
}

/// The read-only surface the service publishes.
#[derive(Debug, Clone)]
pub struct PublishedState {
    reading: SharedReading,
    identity: ServiceIdentity,
}

impl PublishedState {
    pub fn new(reading: SharedReading, identity: ServiceIdentity) -> Self {
        Self { reading, identity }
    }

    pub fn temperature(&self) -> f64 {
        self.reading.read().temperature
    }

    pub fn voltage(&self) -> f64 {
        self.reading.read().voltage
    }

    pub fn version(&self) -> &str {
        &self.identity.version
    }

    /// Look a property up by its published name.
    pub fn get(&self, name: &str) -> Option<PropertyValue> {
        match name {
            PROP_TEMPERATURE => Some(PropertyValue::Double(self.temperature())),
            PROP_VOLTAGE => Some(PropertyValue::Double(self.voltage())),
            PROP_VERSION => Some(PropertyValue::Str(self.version().to_string())),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> PropertySnapshot {
        let reading = self.reading.read();
        PropertySnapshot {
            temperature: reading.temperature,
            voltage: reading.voltage,
            version: self.identity.version.clone(),
        }
    }
}
