//! Read-only snapshot of arbiter state.

use crate::registry::resolve;
use crate::ArbiterError;
use onelane_types::{BridgeStatus, QueueSnapshot, Vehicle, VehicleId};
use std::collections::BTreeMap;
use std::time::Duration;

/// Consistent copy of the bridge, queues and vehicle records at one instant.
///
/// Runners publish one after every mutation so status reads never wait on
/// the arbiter lock.
#[derive(Debug, Clone)]
pub struct ArbiterSnapshot {
    pub taken_at: Duration,
    pub bridge: BridgeStatus,
    pub queues: QueueSnapshot,
    /// Admissions since startup.
    pub admitted_total: u64,
    pub(crate) vehicles: BTreeMap<VehicleId, Vehicle>,
}

impl Default for ArbiterSnapshot {
    fn default() -> Self {
        Self {
            taken_at: Duration::ZERO,
            bridge: BridgeStatus::idle(),
            queues: QueueSnapshot::default(),
            admitted_total: 0,
            vehicles: BTreeMap::new(),
        }
    }
}

impl ArbiterSnapshot {
    /// Same lookup semantics as [`BridgeArbiter::get`](crate::BridgeArbiter::get).
    pub fn vehicle(&self, id: VehicleId) -> Result<&Vehicle, ArbiterError> {
        resolve(self.vehicles.get(&id), id)
    }

    /// All vehicle records, in id order.
    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }
}
