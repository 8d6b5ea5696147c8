//! One-lane bridge arbiter.
//!
//! This crate provides the `BridgeArbiter`, a synchronous state machine that
//! lets vehicles arriving from two opposite directions share a lane that
//! carries one vehicle at a time.
//!
//! # Architecture
//!
//! ```text
//! register ──► VehicleRegistry ──► DirectionalQueues
//!                                       │
//!                                       ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │ BridgeArbiter.handle(SchedulerTick)                         │
//! │                                                             │
//! │   1. Complete the current crossing if its duration elapsed  │
//! │      → CrossingRecord to StatsAggregator                    │
//! │      → vehicle RESTING, or RETIRED if stop was requested    │
//! │   2. Re-queue vehicles whose resting period is over         │
//! │   3. If the lane is free, ask the FairnessPolicy for a      │
//! │      direction and admit that queue's head                  │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │ BridgeArbiter.handle(LivenessScan)                          │
//! │                                                             │
//! │   1. Evict WAITING/RESTING vehicles with stale heartbeats   │
//! │   2. Purge retired records past their grace period          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All bridge and queue mutation happens through `&mut BridgeArbiter`, so a
//! runner that owns the arbiter behind one lock gets a single exclusion
//! domain for free.
//!
//! # Components
//!
//! - [`BridgeArbiter`] - Main state machine
//! - [`VehicleRegistry`] - Owns vehicle records
//! - [`DirectionalQueues`] - FIFO admission lists per direction
//! - [`FairnessPolicy`] - Pluggable direction selection
//! - [`LivenessMonitor`] - Heartbeat expiry
//! - [`StatsAggregator`] - Crossing history and derived metrics
//! - [`ArbiterSnapshot`] - Read-only view for lock-free reads

mod config;
mod error;
mod liveness;
mod policy;
mod queues;
mod registry;
mod snapshot;
mod state;
mod stats;

pub use config::{ArbiterConfig, FairnessConfig};
pub use error::ArbiterError;
pub use liveness::LivenessMonitor;
pub use policy::{ArrivalOrder, DirectionFairness, FairnessPolicy, HeadInfo, SelectionView};
pub use queues::{DirectionalQueues, QueueEntry};
pub use registry::{StopOutcome, VehicleRegistry};
pub use snapshot::ArbiterSnapshot;
pub use state::BridgeArbiter;
pub use stats::StatsAggregator;
