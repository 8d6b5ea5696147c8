//! Bridge arbiter state machine.

use crate::policy::{DirectionFairness, FairnessPolicy, HeadInfo, SelectionView};
use crate::{
    ArbiterConfig, ArbiterError, ArbiterSnapshot, DirectionalQueues, LivenessMonitor, StatsAggregator,
    StopOutcome, VehicleRegistry,
};
use onelane_core::{Action, Event, StateMachine, TimerId};
use onelane_types::{
    crossing_duration, BridgeStatus, CrossingRecord, Direction, QueueSnapshot, RetireReason, Speed,
    TrafficLight, Vehicle, VehicleId, VehicleStats, VehicleStatus,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The single lane.
#[derive(Debug, Default)]
struct LaneSlot {
    /// Vehicle on the bridge; `Some` iff the bridge is busy.
    current: Option<VehicleId>,
    /// Direction of the most recent admission.
    current_direction: Option<Direction>,
    /// Consecutive admissions from `current_direction`.
    streak: u32,
    /// Admissions since startup.
    admitted: u64,
}

/// A queue head that was popped but is no longer admissible (evicted or
/// retired since it was queued). Selection re-runs; never surfaced.
#[derive(Debug)]
struct RaceRetry(VehicleId);

/// Coordinates vehicles over a one-lane bridge.
///
/// Owns the registry, both queues, the lane slot and the crossing history.
/// Request methods and timer events all take `&mut self`, so at most one
/// admission decision is ever in flight.
#[derive(Debug)]
pub struct BridgeArbiter {
    config: ArbiterConfig,
    registry: VehicleRegistry,
    queues: DirectionalQueues,
    policy: Box<dyn FairnessPolicy>,
    liveness: LivenessMonitor,
    stats: StatsAggregator,
    lane: LaneSlot,
    now: Duration,
}

impl BridgeArbiter {
    /// Create an arbiter using [`DirectionFairness`] built from the config.
    pub fn new(config: ArbiterConfig) -> Self {
        let policy = Box::new(DirectionFairness::new(&config.fairness));
        Self::with_policy(config, policy)
    }

    /// Create an arbiter with a custom direction policy.
    pub fn with_policy(config: ArbiterConfig, policy: Box<dyn FairnessPolicy>) -> Self {
        Self {
            liveness: LivenessMonitor::new(config.heartbeat_timeout),
            config,
            registry: VehicleRegistry::new(),
            queues: DirectionalQueues::new(),
            policy,
            stats: StatsAggregator::new(),
            lane: LaneSlot::default(),
            now: Duration::ZERO,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Requests
    // ═══════════════════════════════════════════════════════════════════════════

    /// Register a vehicle and queue it for crossing.
    ///
    /// A token that already belongs to a live vehicle re-attaches to it: the
    /// heartbeat is refreshed and the existing id returned, nothing is
    /// queued twice. If the lane is free the head is admitted immediately.
    pub fn register(
        &mut self,
        direction: Direction,
        speed: i64,
        token: Option<String>,
    ) -> Result<VehicleId, ArbiterError> {
        let speed = Speed::new(speed).ok_or(ArbiterError::InvalidSpeed(speed))?;

        if let Some(id) = token
            .as_deref()
            .and_then(|t| self.registry.find_live_by_token(t))
        {
            self.registry.touch_heartbeat(id, self.now)?;
            info!(vehicle_id = id.0, "Vehicle re-attached by token");
            return Ok(id);
        }

        let id = self.registry.insert(token, direction, speed, self.now);
        self.queues.enqueue(direction, id, self.now);
        info!(
            vehicle_id = id.0,
            direction = %direction,
            speed = speed.get(),
            north_queue = self.queues.size(Direction::North),
            south_queue = self.queues.size(Direction::South),
            "Vehicle registered"
        );

        self.try_admit();
        Ok(id)
    }

    /// Look up a vehicle record.
    pub fn get(&self, id: VehicleId) -> Result<Vehicle, ArbiterError> {
        self.registry.get(id).cloned()
    }

    /// Record a heartbeat for a vehicle.
    pub fn touch_heartbeat(&mut self, id: VehicleId) -> Result<(), ArbiterError> {
        self.registry.touch_heartbeat(id, self.now)
    }

    /// Ask a vehicle to stop after its pending crossing.
    ///
    /// Advisory: a crossing in progress is never preempted.
    pub fn request_stop(&mut self, id: VehicleId) -> Result<Vec<Action>, ArbiterError> {
        let outcome = self.registry.request_stop(id, self.now)?;
        match outcome {
            StopOutcome::RetiredNow => {
                info!(vehicle_id = id.0, "Resting vehicle stopped and retired");
                Ok(vec![Action::VehicleRetired {
                    vehicle_id: id,
                    reason: RetireReason::Stopped,
                }])
            }
            StopOutcome::Deferred => {
                info!(vehicle_id = id.0, "Stop requested, retiring after crossing");
                Ok(vec![])
            }
            StopOutcome::AlreadyRequested => Ok(vec![]),
        }
    }

    /// Aggregated crossing statistics for a vehicle.
    pub fn compute_stats(&self, id: VehicleId) -> Result<VehicleStats, ArbiterError> {
        self.registry.get(id)?;
        Ok(self.stats.compute(id))
    }

    /// Ordered ids waiting in each direction.
    pub fn queue_snapshot(&self) -> QueueSnapshot {
        self.queues.snapshot()
    }

    /// Current bridge occupancy.
    pub fn bridge_status(&self) -> BridgeStatus {
        let busy = self.lane.current.is_some();
        BridgeStatus {
            busy,
            current_vehicle_id: self.lane.current,
            current_direction: self.lane.current_direction,
            traffic_light: if busy {
                TrafficLight::Red
            } else {
                TrafficLight::Green
            },
            north_queue: self.queues.size(Direction::North),
            south_queue: self.queues.size(Direction::South),
        }
    }

    /// Consistent copy of everything a status read needs.
    pub fn snapshot(&self) -> ArbiterSnapshot {
        ArbiterSnapshot {
            taken_at: self.now,
            bridge: self.bridge_status(),
            queues: self.queue_snapshot(),
            admitted_total: self.lane.admitted,
            vehicles: self.registry.records().clone(),
        }
    }

    /// Seed the crossing history, e.g. from a journal replay.
    ///
    /// Id allocation resumes after the highest replayed id.
    pub fn restore_records(&mut self, records: impl IntoIterator<Item = CrossingRecord>) -> usize {
        let mut restored = 0;
        for record in records {
            self.registry.reserve_through(record.vehicle_id);
            self.stats.record(record);
            restored += 1;
        }
        restored
    }

    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    pub fn registry(&self) -> &VehicleRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Vehicles admitted onto the bridge since startup.
    pub fn admitted_total(&self) -> u64 {
        self.lane.admitted
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Timer events
    // ═══════════════════════════════════════════════════════════════════════════

    /// Complete a due crossing, re-queue rested vehicles, admit the next one.
    pub fn on_scheduler_tick(&mut self) -> Vec<Action> {
        let mut actions = vec![Action::SetTimer {
            id: TimerId::Scheduler,
            duration: self.config.tick_interval,
        }];

        self.complete_due_crossing(&mut actions);
        self.requeue_rested();
        self.try_admit();

        actions
    }

    /// Evict stale idle vehicles and purge old retired records.
    pub fn on_liveness_scan(&mut self) -> Vec<Action> {
        let mut actions = vec![Action::SetTimer {
            id: TimerId::Liveness,
            duration: self.config.liveness_interval,
        }];

        let stale = self.liveness.stale_vehicles(self.registry.iter(), self.now);
        for id in stale {
            self.queues.remove(id);
            self.registry.retire(id, RetireReason::Evicted, self.now);
            info!(
                vehicle_id = id.0,
                timeout = ?self.liveness.heartbeat_timeout(),
                "Evicted vehicle with stale heartbeat"
            );
            actions.push(Action::VehicleRetired {
                vehicle_id: id,
                reason: RetireReason::Evicted,
            });
        }

        let purged = self
            .registry
            .purge_retired(self.now, self.config.retired_grace);
        if !purged.is_empty() {
            debug!(count = purged.len(), "Purged retired vehicles");
        }

        actions
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Lane transitions
    // ═══════════════════════════════════════════════════════════════════════════

    fn complete_due_crossing(&mut self, actions: &mut Vec<Action>) {
        let Some(id) = self.lane.current else {
            return;
        };
        let now = self.now;

        let Some(vehicle) = self.registry.get_mut(id) else {
            warn!(vehicle_id = id.0, "Crossing vehicle missing from registry, freeing lane");
            self.lane.current = None;
            return;
        };

        let (Some(started), Some(duration)) = (vehicle.crossing_started_at, vehicle.crossing_duration)
        else {
            warn!(vehicle_id = id.0, "Crossing vehicle has no crossing timing, freeing lane");
            self.lane.current = None;
            return;
        };

        if now.saturating_sub(started) < duration {
            return;
        }

        let record = CrossingRecord {
            vehicle_id: id,
            direction: vehicle.direction,
            crossing: duration,
            waiting: started.saturating_sub(vehicle.enqueued_at.unwrap_or(started)),
            completed_at: now,
        };

        vehicle.crossing_started_at = None;
        vehicle.crossing_duration = None;
        vehicle.enqueued_at = None;
        let stop_requested = vehicle.stop_requested;

        if stop_requested {
            self.registry.retire(id, RetireReason::Stopped, now);
            actions.push(Action::VehicleRetired {
                vehicle_id: id,
                reason: RetireReason::Stopped,
            });
        } else {
            vehicle.status = VehicleStatus::Resting;
            vehicle.can_requeue_at = Some(now + self.config.resting_period);
        }

        self.lane.current = None;
        info!(
            vehicle_id = id.0,
            direction = %record.direction,
            duration_ms = record.crossing.as_millis() as u64,
            waiting_ms = record.waiting.as_millis() as u64,
            retired = stop_requested,
            "Crossing completed, lane free"
        );

        self.stats.record(record.clone());
        actions.push(Action::RecordCrossing(record));
    }

    fn requeue_rested(&mut self) {
        let now = self.now;
        let due: Vec<(VehicleId, Direction)> = self
            .registry
            .iter()
            .filter(|v| {
                v.status == VehicleStatus::Resting && v.can_requeue_at.is_some_and(|at| at <= now)
            })
            .map(|v| (v.id, v.direction))
            .collect();

        for (id, direction) in due {
            if let Some(vehicle) = self.registry.get_mut(id) {
                vehicle.status = VehicleStatus::Waiting;
                vehicle.enqueued_at = Some(now);
            }
            self.queues.enqueue(direction, id, now);
            debug!(vehicle_id = id.0, direction = %direction, "Rested vehicle re-queued");
        }
    }

    /// Admit the next vehicle if the lane is free.
    fn try_admit(&mut self) -> Option<VehicleId> {
        if self.lane.current.is_some() {
            return None;
        }

        loop {
            let view = self.selection_view();
            let direction = self.policy.select(&view)?;

            let Some(entry) = self.queues.dequeue(direction) else {
                warn!(
                    policy = self.policy.name(),
                    direction = %direction,
                    "Policy selected an empty queue"
                );
                return None;
            };

            match self.admit(direction, entry.vehicle_id) {
                Ok(id) => return Some(id),
                Err(RaceRetry(stale)) => {
                    debug!(vehicle_id = stale.0, "Queue head no longer admissible, reselecting");
                }
            }
        }
    }

    fn admit(&mut self, direction: Direction, id: VehicleId) -> Result<VehicleId, RaceRetry> {
        let now = self.now;
        let vehicle = self
            .registry
            .get_mut(id)
            .filter(|v| v.status == VehicleStatus::Waiting)
            .ok_or(RaceRetry(id))?;

        let duration = crossing_duration(vehicle.speed);
        vehicle.status = VehicleStatus::Crossing;
        vehicle.crossing_started_at = Some(now);
        vehicle.crossing_duration = Some(duration);

        if self.lane.current_direction == Some(direction) {
            self.lane.streak += 1;
        } else {
            self.lane.streak = 1;
        }
        self.lane.current = Some(id);
        self.lane.current_direction = Some(direction);
        self.lane.admitted += 1;

        info!(
            vehicle_id = id.0,
            direction = %direction,
            duration_ms = duration.as_millis() as u64,
            streak = self.lane.streak,
            "Vehicle admitted onto bridge"
        );
        Ok(id)
    }

    fn selection_view(&self) -> SelectionView {
        let head = |d: Direction| {
            self.queues.peek(d).map(|entry| HeadInfo {
                arrival: entry.arrival,
                waited: self.now.saturating_sub(entry.enqueued_at),
            })
        };
        SelectionView {
            current: self.lane.current_direction,
            streak: self.lane.streak,
            heads: [head(Direction::North), head(Direction::South)],
        }
    }
}

impl StateMachine for BridgeArbiter {
    fn handle(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::SchedulerTick => self.on_scheduler_tick(),
            Event::LivenessScan => self.on_liveness_scan(),
        }
    }

    fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    fn now(&self) -> Duration {
        self.now
    }
}
