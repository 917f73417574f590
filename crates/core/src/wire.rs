//! JSON message shapes shared by the service and the client.
//!
//! The service serializes these on its HTTP and WebSocket endpoints; the
//! client deserializes the same types, so the two sides cannot drift apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::names::{MSG_TYPE_SIGNAL, OBJECT_PATH, SERVICE_INTERFACE};
use crate::published::PropertyValue;

/// `GET /health` response: liveness plus the published identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub bus_name: String,
    pub interface: String,
    pub object_path: String,
    pub version: String,
}

/// `GET /api/v1/properties/{name}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyResponse {
    pub name: String,
    pub value: PropertyValue,
}

/// A signal frame pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMessage {
    /// Always [`MSG_TYPE_SIGNAL`].
    pub r#type: String,
    pub interface: String,
    pub path: String,
    /// Signal name, e.g. `TemperatureThresholdExceeded`.
    pub member: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl SignalMessage {
    /// Build a signal frame for this service's interface and object path.
    pub fn new(
        member: impl Into<String>,
        payload: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            r#type: MSG_TYPE_SIGNAL.to_string(),
            interface: SERVICE_INTERFACE.to_string(),
            path: OBJECT_PATH.to_string(),
            member: member.into(),
            payload,
            timestamp,
        }
    }
}
