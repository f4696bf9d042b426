//! Simulated order backend.
//!
//! Serves the configured catalog and keeps submitted orders in an in-memory order
//! store, injecting latency and random failures per operation.

/// Order store operations on top of `SeaORM`
pub mod store;

/// [`crate::api::OrderApi`] implementation with latency and failure injection
pub mod simulated;

pub use simulated::SimulatedBackend;
