//! Vehicle registry.
//!
//! Owns every vehicle record. Queues and the bridge slot only hold ids.

use crate::ArbiterError;
use onelane_types::{Direction, RetireReason, Speed, Vehicle, VehicleId, VehicleStatus};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

/// What a stop request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Flag set; the vehicle retires when its pending crossing completes.
    Deferred,
    /// The vehicle was idle and retired on the spot.
    RetiredNow,
    /// Stop had already been requested, or the vehicle already drained.
    AlreadyRequested,
}

/// Owns vehicle records, keyed by id.
///
/// Records are kept in id order so iteration (and therefore every scan the
/// arbiter does) is deterministic.
#[derive(Debug)]
pub struct VehicleRegistry {
    vehicles: BTreeMap<VehicleId, Vehicle>,
    /// Correlation token -> most recent vehicle registered with it.
    tokens: HashMap<String, VehicleId>,
    next_id: VehicleId,
}

impl Default for VehicleRegistry {
    fn default() -> Self {
        Self {
            vehicles: BTreeMap::new(),
            tokens: HashMap::new(),
            next_id: VehicleId::FIRST,
        }
    }
}

/// Resolve a lookup result into the error taxonomy.
///
/// Evicted vehicles are reported as expired rather than returned, so clients
/// can tell "was evicted" apart from "never existed".
pub(crate) fn resolve(vehicle: Option<&Vehicle>, id: VehicleId) -> Result<&Vehicle, ArbiterError> {
    match vehicle {
        None => Err(ArbiterError::NotFound(id)),
        Some(v) if v.is_evicted() => Err(ArbiterError::ExpiredSession(id)),
        Some(v) => Ok(v),
    }
}

impl VehicleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a WAITING vehicle and return its id.
    ///
    /// The caller is responsible for enqueuing it. Without a token, one is
    /// generated from the id.
    pub fn insert(
        &mut self,
        token: Option<String>,
        direction: Direction,
        speed: Speed,
        now: Duration,
    ) -> VehicleId {
        let id = self.next_id;
        self.next_id = id.next();

        let token = token.unwrap_or_else(|| format!("car-{}", id.as_u64()));
        self.tokens.insert(token.clone(), id);
        self.vehicles
            .insert(id, Vehicle::new(id, token, direction, speed, now));
        id
    }

    /// Make sure future ids are strictly greater than `id`.
    ///
    /// Used after replaying history so new vehicles never inherit the
    /// crossings of an earlier process's vehicle.
    pub fn reserve_through(&mut self, id: VehicleId) {
        if self.next_id <= id {
            self.next_id = id.next();
        }
    }

    /// Live (non-retired) vehicle registered under `token`, if any.
    pub fn find_live_by_token(&self, token: &str) -> Option<VehicleId> {
        let id = *self.tokens.get(token)?;
        self.vehicles
            .get(&id)
            .filter(|v| !v.status.is_retired())
            .map(|v| v.id)
    }

    /// Look up a vehicle, classifying evicted records as expired sessions.
    pub fn get(&self, id: VehicleId) -> Result<&Vehicle, ArbiterError> {
        resolve(self.vehicles.get(&id), id)
    }

    /// Raw lookup, including evicted records.
    pub fn lookup(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(&id)
    }

    /// Record a heartbeat.
    ///
    /// Fails with `NotFound` for unknown ids and `ExpiredSession` for any
    /// retired vehicle: a drained or evicted session cannot be revived.
    pub fn touch_heartbeat(&mut self, id: VehicleId, now: Duration) -> Result<(), ArbiterError> {
        let vehicle = self
            .vehicles
            .get_mut(&id)
            .ok_or(ArbiterError::NotFound(id))?;
        if vehicle.status.is_retired() {
            return Err(ArbiterError::ExpiredSession(id));
        }
        vehicle.last_heartbeat = now;
        Ok(())
    }

    /// Ask a vehicle to stop.
    ///
    /// Idle (RESTING) vehicles retire immediately. WAITING and CROSSING
    /// vehicles keep their crossing and retire when it completes. Repeated
    /// calls are no-ops.
    pub fn request_stop(&mut self, id: VehicleId, now: Duration) -> Result<StopOutcome, ArbiterError> {
        let vehicle = self
            .vehicles
            .get_mut(&id)
            .ok_or(ArbiterError::NotFound(id))?;

        if vehicle.is_evicted() {
            return Err(ArbiterError::ExpiredSession(id));
        }
        if vehicle.status.is_retired() || vehicle.stop_requested {
            return Ok(StopOutcome::AlreadyRequested);
        }

        vehicle.stop_requested = true;
        if vehicle.status == VehicleStatus::Resting {
            self.retire(id, RetireReason::Stopped, now);
            return Ok(StopOutcome::RetiredNow);
        }
        Ok(StopOutcome::Deferred)
    }

    /// Mark a vehicle RETIRED. Queue removal is the caller's job.
    pub fn retire(&mut self, id: VehicleId, reason: RetireReason, now: Duration) {
        if let Some(vehicle) = self.vehicles.get_mut(&id) {
            vehicle.status = VehicleStatus::Retired;
            vehicle.retire_reason = Some(reason);
            vehicle.retired_at = Some(now);
            vehicle.enqueued_at = None;
            vehicle.crossing_started_at = None;
            vehicle.crossing_duration = None;
        }
    }

    /// Drop retired records older than `grace`. Returns the purged ids.
    pub fn purge_retired(&mut self, now: Duration, grace: Duration) -> Vec<VehicleId> {
        let expired: Vec<VehicleId> = self
            .vehicles
            .values()
            .filter(|v| {
                v.retired_at
                    .is_some_and(|at| now.saturating_sub(at) > grace)
            })
            .map(|v| v.id)
            .collect();

        for id in &expired {
            if let Some(vehicle) = self.vehicles.remove(id) {
                if self.tokens.get(&vehicle.token) == Some(id) {
                    self.tokens.remove(&vehicle.token);
                }
                debug!(vehicle_id = id.0, "Purged retired vehicle");
            }
        }

        expired
    }

    /// Iterate all records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Number of vehicles with the given status.
    pub fn count_with_status(&self, status: VehicleStatus) -> usize {
        self.vehicles.values().filter(|v| v.status == status).count()
    }

    /// Number of records, retired ones included.
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub(crate) fn records(&self) -> &BTreeMap<VehicleId, Vehicle> {
        &self.vehicles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onelane_test_helpers::{secs, speed};

    #[test]
    fn test_insert_assigns_sequential_ids_and_tokens() {
        let mut registry = VehicleRegistry::new();
        let a = registry.insert(None, Direction::North, speed(5), secs(0));
        let b = registry.insert(Some("abc".into()), Direction::South, speed(2), secs(1));

        assert_eq!(a, VehicleId(1));
        assert_eq!(b, VehicleId(2));
        assert_eq!(registry.get(a).unwrap().token, "car-1");
        assert_eq!(registry.find_live_by_token("abc"), Some(b));
        assert_eq!(registry.get(b).unwrap().status, VehicleStatus::Waiting);
    }

    #[test]
    fn test_get_distinguishes_unknown_and_evicted() {
        let mut registry = VehicleRegistry::new();
        let id = registry.insert(None, Direction::North, speed(5), secs(0));

        assert_eq!(
            registry.get(VehicleId(99)).unwrap_err(),
            ArbiterError::NotFound(VehicleId(99))
        );

        registry.retire(id, RetireReason::Evicted, secs(20));
        assert_eq!(registry.get(id).unwrap_err(), ArbiterError::ExpiredSession(id));
        assert_eq!(
            registry.touch_heartbeat(id, secs(21)).unwrap_err(),
            ArbiterError::ExpiredSession(id)
        );
        assert!(registry.find_live_by_token("car-1").is_none());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut registry = VehicleRegistry::new();
        let id = registry.insert(None, Direction::South, speed(9), secs(0));

        assert_eq!(registry.request_stop(id, secs(1)), Ok(StopOutcome::Deferred));
        let after_first = registry.get(id).unwrap().clone();
        assert_eq!(
            registry.request_stop(id, secs(2)),
            Ok(StopOutcome::AlreadyRequested)
        );
        assert_eq!(registry.get(id).unwrap(), &after_first);
    }

    #[test]
    fn test_stop_while_resting_retires_immediately() {
        let mut registry = VehicleRegistry::new();
        let id = registry.insert(None, Direction::South, speed(9), secs(0));
        registry.get_mut(id).unwrap().status = VehicleStatus::Resting;

        assert_eq!(registry.request_stop(id, secs(3)), Ok(StopOutcome::RetiredNow));
        let vehicle = registry.get(id).unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Retired);
        assert_eq!(vehicle.retire_reason, Some(RetireReason::Stopped));
        assert_eq!(
            registry.request_stop(id, secs(4)),
            Ok(StopOutcome::AlreadyRequested)
        );
    }

    #[test]
    fn test_reserve_through_skips_replayed_ids() {
        let mut registry = VehicleRegistry::new();
        registry.reserve_through(VehicleId(7));
        registry.reserve_through(VehicleId(3));
        assert_eq!(
            registry.insert(None, Direction::North, speed(5), secs(0)),
            VehicleId(8)
        );
    }

    #[test]
    fn test_purge_after_grace() {
        let mut registry = VehicleRegistry::new();
        let id = registry.insert(Some("tok".into()), Direction::North, speed(1), secs(0));
        registry.retire(id, RetireReason::Stopped, secs(10));

        assert!(registry.purge_retired(secs(15), secs(10)).is_empty());
        assert_eq!(registry.purge_retired(secs(21), secs(10)), vec![id]);
        assert_eq!(registry.get(id).unwrap_err(), ArbiterError::NotFound(id));
        assert!(registry.is_empty());
    }
}
