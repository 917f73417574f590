//! Well-known service identity names and message type constants.
//!
//! These are the canonical names under which the service publishes its
//! properties and signal, shared by the service (when serving) and the
//! client (when parsing).

/// Stable, well-known name of the health monitor service.
pub const BUS_NAME: &str = "com.example.HardwareHealthMonitor";

/// Interface the properties and signal belong to.
pub const SERVICE_INTERFACE: &str = "com.example.HealthMonitor";

/// Addressable object path of the published endpoint.
pub const OBJECT_PATH: &str = "/com/example/HealthMonitor";

/// Version reported through the `Version` property.
pub const SERVICE_VERSION: &str = "1.0.0-prototype";

/// Read-only property: current temperature in degrees Celsius (`f64`).
pub const PROP_TEMPERATURE: &str = "Temperature";

/// Read-only property: current core voltage in volts (`f64`).
pub const PROP_VOLTAGE: &str = "Voltage";

/// Read-only property: service version string.
pub const PROP_VERSION: &str = "Version";

/// All exposed property names, in introspection order.
pub const PROPERTY_NAMES: [&str; 3] = [PROP_TEMPERATURE, PROP_VOLTAGE, PROP_VERSION];

/// Signal emitted on the rising edge of a temperature threshold crossing.
///
/// Carries a single argument, `current_temp` (`f64`).
pub const SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED: &str = "TemperatureThresholdExceeded";

/// WebSocket message type discriminator for signal frames.
pub const MSG_TYPE_SIGNAL: &str = "signal";
