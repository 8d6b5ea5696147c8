//! Crossing records and the statistics derived from them.

use crate::time::millis;
use crate::{Direction, Speed, VehicleId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest crossing, at [`Speed::MAX`].
const MIN_CROSSING_SECS: u64 = 4;
/// Longest crossing, at [`Speed::MIN`].
const MAX_CROSSING_SECS: u64 = 12;

/// Crossing duration for a given speed.
///
/// Inverse-linear in speed: `round(4 + (10 - speed) / 9 * 8)` seconds,
/// clamped to `[4, 12]`. Speed 10 crosses in 4s, speed 1 in 12s.
pub fn crossing_duration(speed: Speed) -> Duration {
    let max = Speed::MAX.get() as f64;
    let span = (Speed::MAX.get() - Speed::MIN.get()) as f64;
    let range = (MAX_CROSSING_SECS - MIN_CROSSING_SECS) as f64;

    let secs = (MIN_CROSSING_SECS as f64 + (max - speed.get() as f64) / span * range).round();
    Duration::from_secs((secs as u64).clamp(MIN_CROSSING_SECS, MAX_CROSSING_SECS))
}

/// Append-only entry written when a crossing completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingRecord {
    pub vehicle_id: VehicleId,
    pub direction: Direction,
    /// Time spent on the bridge.
    #[serde(rename = "crossing_ms", with = "millis")]
    pub crossing: Duration,
    /// Time from enqueue to admission.
    #[serde(rename = "waiting_ms", with = "millis")]
    pub waiting: Duration,
    #[serde(rename = "completed_at_ms", with = "millis")]
    pub completed_at: Duration,
}

/// Aggregated metrics for one vehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleStats {
    pub total_crossings: u64,
    pub total_time_on_bridge_sec: f64,
    pub avg_crossing_time_sec: f64,
    pub total_waiting_time_sec: f64,
    pub avg_waiting_time_sec: f64,
    /// In `[0, 100]`; 0 when no time has been accounted at all.
    pub time_in_bridge_percent: f64,
}
