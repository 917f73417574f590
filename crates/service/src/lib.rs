//! Hardware health monitor service library.
//!
//! Exposes the building blocks (config, state, background loops, routes,
//! WebSocket signal stream) so integration tests and the binary entrypoint
//! can both access them.

pub mod background;
pub mod config;
pub mod error;
pub mod router;
pub mod routes;
pub mod runtime;
pub mod state;
pub mod ws;
