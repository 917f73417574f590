//! `healthmon-client` library crate.
//!
//! A consumer of the health monitor service: connects, subscribes to the
//! threshold signal, and polls the published properties on an interval.
//! The binary entrypoint lives in `main.rs`.

pub mod alerts;
pub mod backoff;
pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod proxy;

pub use client::MonitorClient;
pub use config::{ClientConfig, PollFailurePolicy};
pub use error::ClientError;
