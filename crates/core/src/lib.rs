//! Hardware health monitor domain logic.
//!
//! Everything in this crate is pure in-memory logic with no I/O, so it can
//! be tested in isolation and shared by the service and client binaries:
//!
//! - [`sensor`] -- the simulated sensor and its replaceable drift policies.
//! - [`threshold`] -- rising-edge threshold detection and the alert event.
//! - [`published`] -- the externally readable property view.
//! - [`wire`] -- JSON message shapes exchanged between service and client.

pub mod error;
pub mod names;
pub mod published;
pub mod reading;
pub mod sensor;
pub mod threshold;
pub mod wire;

pub use error::CoreError;
pub use published::{PropertySnapshot, PropertyValue, PublishedState};
pub use reading::{SensorReading, ServiceIdentity};
pub use sensor::{
    DriftModel, ScriptedModel, SensorModel, SensorSource, SharedReading, SpikePolicy,
};
pub use threshold::{ThresholdEvent, ThresholdState};
