//! Shared fixtures for tests across the workspace.
//!
//! Only depends on the types and core crates so that any crate can pull it
//! in as a dev-dependency without creating a cycle.

use onelane_core::{Action, Clock};
use onelane_types::{CrossingRecord, Direction, RetireReason, Speed, Vehicle, VehicleId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

pub fn millis(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// A validated speed.
///
/// # Panics
///
/// If `raw` is outside `[1, 10]`.
pub fn speed(raw: i64) -> Speed {
    Speed::new(raw).unwrap_or_else(|| panic!("test speed out of range: {}", raw))
}

/// A freshly registered, WAITING vehicle with a generated token.
pub fn vehicle(id: u64, direction: Direction, raw_speed: i64, now: Duration) -> Vehicle {
    Vehicle::new(
        VehicleId(id),
        format!("car-{}", id),
        direction,
        speed(raw_speed),
        now,
    )
}

/// A northbound crossing record completed at `waiting + crossing` seconds.
pub fn crossing_record(vehicle_id: u64, crossing_secs: u64, waiting_secs: u64) -> CrossingRecord {
    CrossingRecord {
        vehicle_id: VehicleId(vehicle_id),
        direction: Direction::North,
        crossing: secs(crossing_secs),
        waiting: secs(waiting_secs),
        completed_at: secs(waiting_secs + crossing_secs),
    }
}

/// Crossing records emitted in a batch of actions, in order.
pub fn recorded_crossings(actions: &[Action]) -> Vec<CrossingRecord> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::RecordCrossing(record) => Some(record.clone()),
            _ => None,
        })
        .collect()
}

/// Vehicles retired in a batch of actions, with the reason.
pub fn retirements(actions: &[Action]) -> Vec<(VehicleId, RetireReason)> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::VehicleRetired { vehicle_id, reason } => Some((*vehicle_id, *reason)),
            _ => None,
        })
        .collect()
}

/// A [`Clock`] that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Duration) -> Self {
        Self {
            nanos: AtomicU64::new(start.as_nanos() as u64),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, to: Duration) {
        self.nanos.store(to.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}
