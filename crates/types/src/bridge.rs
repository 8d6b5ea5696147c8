//! Bridge-wide observable state.

use crate::{Direction, VehicleId};
use serde::{Deserialize, Serialize};

/// Traffic light shown to approaching vehicles.
///
/// GREEN iff the lane is free, i.e. the next selected vehicle can be admitted
/// immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrafficLight {
    Green,
    Red,
}

/// Bridge status as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub busy: bool,
    /// Valid only while `busy`.
    pub current_vehicle_id: Option<VehicleId>,
    /// Direction of the current (or most recent) crossing.
    pub current_direction: Option<Direction>,
    pub traffic_light: TrafficLight,
    pub north_queue: usize,
    pub south_queue: usize,
}

impl BridgeStatus {
    /// Status of a free bridge with no traffic history.
    pub fn idle() -> Self {
        Self {
            busy: false,
            current_vehicle_id: None,
            current_direction: None,
            traffic_light: TrafficLight::Green,
            north_queue: 0,
            south_queue: 0,
        }
    }
}

/// Ordered vehicle ids waiting in each directional queue, head first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub north: Vec<VehicleId>,
    pub south: Vec<VehicleId>,
}

impl QueueSnapshot {
    /// Queue for a single direction.
    pub fn for_direction(&self, direction: Direction) -> &[VehicleId] {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
        }
    }

    /// Whether `id` is queued in either direction.
    pub fn contains(&self, id: VehicleId) -> bool {
        self.north.contains(&id) || self.south.contains(&id)
    }
}
