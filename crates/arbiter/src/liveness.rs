//! Heartbeat-based liveness.

use onelane_types::{Vehicle, VehicleId, VehicleStatus};
use std::time::Duration;

/// Decides which vehicles have abandoned their session.
///
/// Only idle vehicles (WAITING or RESTING) are candidates. A CROSSING vehicle
/// is never evicted, however old its last heartbeat: the crossing always
/// completes so the bridge slot is released cleanly.
#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    heartbeat_timeout: Duration,
}

impl LivenessMonitor {
    pub fn new(heartbeat_timeout: Duration) -> Self {
        Self { heartbeat_timeout }
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        self.heartbeat_timeout
    }

    /// Whether a single vehicle should be evicted at `now`.
    pub fn is_stale(&self, vehicle: &Vehicle, now: Duration) -> bool {
        matches!(
            vehicle.status,
            VehicleStatus::Waiting | VehicleStatus::Resting
        ) && now.saturating_sub(vehicle.last_heartbeat) > self.heartbeat_timeout
    }

    /// Ids of all vehicles that should be evicted at `now`.
    pub fn stale_vehicles<'a>(
        &self,
        vehicles: impl IntoIterator<Item = &'a Vehicle>,
        now: Duration,
    ) -> Vec<VehicleId> {
        vehicles
            .into_iter()
            .filter(|v| self.is_stale(v, now))
            .map(|v| v.id)
            .collect()
    }
}
