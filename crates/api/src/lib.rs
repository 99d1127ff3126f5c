//! Push-delivery ingestion API.
//!
//! Exposes the building blocks (config, state, envelope parsing, dispatcher,
//! ack policy, routes) so integration tests and the binary entrypoint can
//! both access them.

pub mod ack;
pub mod app;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod routes;
pub mod state;
