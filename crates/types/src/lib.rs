//! Core types for the one-lane bridge coordinator.
//!
//! These are plain data types shared by the arbiter state machine, the
//! server runner and the driver client. They carry no behaviour beyond
//! validation and formatting.

mod bridge;
mod crossing;
mod identifiers;
pub mod time;
mod vehicle;

pub use bridge::{BridgeStatus, QueueSnapshot, TrafficLight};
pub use crossing::{crossing_duration, CrossingRecord, VehicleStats};
pub use identifiers::VehicleId;
pub use vehicle::{
    Direction, ParseDirectionError, RetireReason, Speed, SpeedOutOfRange, Vehicle, VehicleStatus,
};
