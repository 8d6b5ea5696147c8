//! Tokio runner for the bridge arbiter.
//!
//! [`BridgeRunner`] owns the event loop; [`BridgeHandle`] is the cheap,
//! cloneable side the HTTP layer talks to. Every call into the arbiter
//! happens under one `parking_lot::Mutex` after `set_time(clock.now())`,
//! and every state-changing call republishes the read snapshot.

use crate::journal::CrossingJournal;
use crate::metrics::BridgeMetrics;
use arc_swap::ArcSwap;
use onelane_arbiter::{ArbiterError, ArbiterSnapshot, BridgeArbiter};
use onelane_core::{Action, Clock, Event, StateMachine, TimerId};
use onelane_types::{
    BridgeStatus, CrossingRecord, Direction, QueueSnapshot, Vehicle, VehicleId, VehicleStats,
};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct Shared {
    arbiter: Mutex<BridgeArbiter>,
    snapshot: ArcSwap<ArbiterSnapshot>,
    clock: Arc<dyn Clock>,
    journal: Option<CrossingJournal>,
    metrics: BridgeMetrics,
    timer_tx: mpsc::UnboundedSender<Event>,
}

/// Client-facing side of the runner.
#[derive(Clone)]
pub struct BridgeHandle {
    shared: Arc<Shared>,
}

impl BridgeHandle {
    /// Run `f` against the arbiter at the current time and publish a fresh
    /// snapshot. Timers are armed and retirements logged before returning;
    /// completed crossings are handed back for journaling.
    fn apply<T>(
        &self,
        f: impl FnOnce(&mut BridgeArbiter) -> Result<(T, Vec<Action>), ArbiterError>,
    ) -> (Result<T, ArbiterError>, Vec<CrossingRecord>) {
        let (result, actions) = {
            let mut arbiter = self.shared.arbiter.lock();
            arbiter.set_time(self.shared.clock.now());
            let (result, actions) = match f(&mut arbiter) {
                Ok((value, actions)) => (Ok(value), actions),
                Err(e) => (Err(e), Vec::new()),
            };
            let snapshot = arbiter.snapshot();
            self.shared.metrics.observe_actions(&actions);
            self.shared.metrics.observe_snapshot(&snapshot);
            self.shared.snapshot.store(Arc::new(snapshot));
            (result, actions)
        };
        (result, self.execute(actions))
    }

    /// [`apply`](Self::apply), then journal on the calling thread.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut BridgeArbiter) -> Result<(T, Vec<Action>), ArbiterError>,
    ) -> Result<T, ArbiterError> {
        let (result, records) = self.apply(f);
        self.write_journal(&records);
        result
    }

    /// Deliver a timer event to the arbiter, journaling inline.
    pub fn dispatch(&self, event: Event) {
        let _ = self.mutate(|arbiter| Ok(((), arbiter.handle(event))));
    }

    /// Deliver a timer event, moving journal writes to the blocking pool.
    ///
    /// Used by the event loop so file I/O never stalls a runtime worker.
    /// Awaiting the write keeps journal order equal to completion order.
    pub async fn dispatch_offloaded(&self, event: Event) {
        let (_, records) = self.apply(|arbiter| Ok(((), arbiter.handle(event))));
        if records.is_empty() || self.shared.journal.is_none() {
            return;
        }
        let handle = self.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || handle.write_journal(&records)).await {
            warn!(error = %e, "Journal write task failed");
        }
    }

    /// Register a vehicle, returning its record and the bridge status right
    /// after any immediate admission.
    pub fn register(
        &self,
        direction: Direction,
        speed: i64,
        token: Option<String>,
    ) -> Result<(Vehicle, BridgeStatus), ArbiterError> {
        self.mutate(|arbiter| {
            let id = arbiter.register(direction, speed, token)?;
            Ok(((arbiter.get(id)?, arbiter.bridge_status()), Vec::new()))
        })
    }

    /// Refresh a vehicle's heartbeat.
    ///
    /// Only `last_heartbeat` changes, so the snapshot is left alone and picks
    /// the new value up on the next scheduler tick.
    pub fn heartbeat(&self, id: VehicleId) -> Result<(), ArbiterError> {
        let mut arbiter = self.shared.arbiter.lock();
        arbiter.set_time(self.shared.clock.now());
        arbiter.touch_heartbeat(id)
    }

    pub fn stop(&self, id: VehicleId) -> Result<(), ArbiterError> {
        self.mutate(|arbiter| arbiter.request_stop(id).map(|actions| ((), actions)))
    }

    /// Computed under the lock; the snapshot carries no crossing history.
    pub fn stats(&self, id: VehicleId) -> Result<VehicleStats, ArbiterError> {
        self.shared.arbiter.lock().compute_stats(id)
    }

    pub fn vehicle(&self, id: VehicleId) -> Result<Vehicle, ArbiterError> {
        self.snapshot().vehicle(id).cloned()
    }

    pub fn queues(&self) -> QueueSnapshot {
        self.snapshot().queues.clone()
    }

    pub fn bridge(&self) -> BridgeStatus {
        self.snapshot().bridge.clone()
    }

    /// Latest published snapshot. Never takes the arbiter lock.
    pub fn snapshot(&self) -> Arc<ArbiterSnapshot> {
        self.shared.snapshot.load_full()
    }

    pub fn metrics(&self) -> &BridgeMetrics {
        &self.shared.metrics
    }

    /// Arm timers and log retirements; return the crossings to journal.
    fn execute(&self, actions: Vec<Action>) -> Vec<CrossingRecord> {
        let mut records = Vec::new();
        for action in actions {
            match action {
                Action::SetTimer { id, duration } => self.arm_timer(id, duration),
                Action::RecordCrossing(record) => records.push(record),
                Action::VehicleRetired { vehicle_id, reason } => {
                    debug!(vehicle_id = vehicle_id.0, reason = ?reason, "Vehicle retired");
                }
            }
        }
        records
    }

    fn write_journal(&self, records: &[CrossingRecord]) {
        let Some(journal) = &self.shared.journal else {
            return;
        };
        for record in records {
            if let Err(e) = journal.append(record) {
                self.shared.metrics.journal_error();
                warn!(
                    vehicle_id = record.vehicle_id.0,
                    error = %e,
                    "Failed to journal crossing"
                );
            }
        }
    }

    fn arm_timer(&self, id: TimerId, duration: Duration) {
        let tx = self.shared.timer_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // Receiver gone means the runner shut down.
            let _ = tx.send(id.event());
        });
    }
}

/// Owns the timer event loop.
pub struct BridgeRunner {
    handle: BridgeHandle,
    timer_rx: mpsc::UnboundedReceiver<Event>,
}

impl BridgeRunner {
    pub fn new(
        arbiter: BridgeArbiter,
        clock: Arc<dyn Clock>,
        journal: Option<CrossingJournal>,
    ) -> Result<Self, prometheus::Error> {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let metrics = BridgeMetrics::new()?;
        let snapshot = arbiter.snapshot();
        metrics.observe_snapshot(&snapshot);
        let shared = Shared {
            arbiter: Mutex::new(arbiter),
            snapshot: ArcSwap::from_pointee(snapshot),
            clock,
            journal,
            metrics,
            timer_tx,
        };
        Ok(Self {
            handle: BridgeHandle {
                shared: Arc::new(shared),
            },
            timer_rx,
        })
    }

    pub fn handle(&self) -> BridgeHandle {
        self.handle.clone()
    }

    /// Process timer events until `shutdown` resolves.
    ///
    /// Both timers are fired once on entry; from then on the arbiter re-arms
    /// them itself through `SetTimer`.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        info!("Bridge runner started");
        self.handle.dispatch_offloaded(Event::SchedulerTick).await;
        self.handle.dispatch_offloaded(Event::LivenessScan).await;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(event) = self.timer_rx.recv() => {
                    self.handle.dispatch_offloaded(event).await;
                }
            }
        }
        info!("Bridge runner stopped");
    }
}
