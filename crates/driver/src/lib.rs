//! Simulated vehicle clients for the one-lane bridge coordinator.
//!
//! - [`client::BridgeClient`] - typed HTTP client for the server API
//! - [`vehicle::SimulatedVehicle`] - one vehicle: register, heartbeat,
//!   watch its own state, stop on cancellation
//! - [`swarm::Swarm`] - many random vehicles for a fixed duration

pub mod client;
pub mod config;
pub mod report;
pub mod swarm;
pub mod vehicle;
