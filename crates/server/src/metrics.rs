//! Prometheus metrics for the bridge.
//!
//! Counters follow the arbiter's actions; gauges follow each published
//! snapshot. Both updates happen under the arbiter lock, so a scrape never
//! sees a counter run ahead of the state that produced it.

use onelane_arbiter::ArbiterSnapshot;
use onelane_core::Action;
use onelane_types::{Direction, RetireReason};
use prometheus::{IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

/// Metric handles plus the registry they are exported from.
#[derive(Clone)]
pub struct BridgeMetrics {
    registry: Registry,
    admissions: IntCounter,
    crossings: IntCounter,
    retirements: IntCounterVec,
    journal_errors: IntCounter,
    queue_depth: IntGaugeVec,
    busy: IntGauge,
    live_vehicles: IntGauge,
}

impl BridgeMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let admissions = IntCounter::new(
            "onelane_admissions_total",
            "Vehicles admitted onto the bridge",
        )?;
        let crossings = IntCounter::new(
            "onelane_crossings_completed_total",
            "Crossings completed",
        )?;
        let retirements = IntCounterVec::new(
            Opts::new("onelane_vehicles_retired_total", "Vehicles retired, by reason"),
            &["reason"],
        )?;
        let journal_errors = IntCounter::new(
            "onelane_journal_errors_total",
            "Crossing records that failed to reach the journal",
        )?;
        let queue_depth = IntGaugeVec::new(
            Opts::new("onelane_queue_depth", "Vehicles waiting, by direction"),
            &["direction"],
        )?;
        let busy = IntGauge::new("onelane_bridge_busy", "1 while a vehicle is on the bridge")?;
        let live_vehicles = IntGauge::new(
            "onelane_live_vehicles",
            "Registered vehicles that have not retired",
        )?;

        registry.register(Box::new(admissions.clone()))?;
        registry.register(Box::new(crossings.clone()))?;
        registry.register(Box::new(retirements.clone()))?;
        registry.register(Box::new(journal_errors.clone()))?;
        registry.register(Box::new(queue_depth.clone()))?;
        registry.register(Box::new(busy.clone()))?;
        registry.register(Box::new(live_vehicles.clone()))?;

        // Export every label up front so scrapes see zeros, not gaps.
        for reason in [RetireReason::Stopped, RetireReason::Evicted] {
            retirements.with_label_values(&[reason.as_str()]);
        }
        for direction in Direction::ALL {
            queue_depth.with_label_values(&[direction.as_str()]);
        }

        Ok(Self {
            registry,
            admissions,
            crossings,
            retirements,
            journal_errors,
            queue_depth,
            busy,
            live_vehicles,
        })
    }

    /// Count what a batch of actions reports.
    pub fn observe_actions(&self, actions: &[Action]) {
        for action in actions {
            match action {
                Action::RecordCrossing(_) => self.crossings.inc(),
                Action::VehicleRetired { reason, .. } => self
                    .retirements
                    .with_label_values(&[reason.as_str()])
                    .inc(),
                Action::SetTimer { .. } => {}
            }
        }
    }

    /// Bring gauges, and the admissions counter, in line with a snapshot.
    pub fn observe_snapshot(&self, snapshot: &ArbiterSnapshot) {
        let behind = snapshot.admitted_total.saturating_sub(self.admissions.get());
        if behind > 0 {
            self.admissions.inc_by(behind);
        }

        self.queue_depth
            .with_label_values(&[Direction::North.as_str()])
            .set(snapshot.bridge.north_queue as i64);
        self.queue_depth
            .with_label_values(&[Direction::South.as_str()])
            .set(snapshot.bridge.south_queue as i64);
        self.busy.set(i64::from(snapshot.bridge.busy));
        self.live_vehicles
            .set(snapshot.vehicles().filter(|v| !v.status.is_retired()).count() as i64);
    }

    pub fn journal_error(&self) {
        self.journal_errors.inc();
    }

    /// Render every metric in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onelane_arbiter::{ArbiterConfig, BridgeArbiter};
    use onelane_core::StateMachine;
    use onelane_test_helpers::{crossing_record, secs};
    use onelane_types::VehicleId;

    #[test]
    fn test_actions_drive_counters() {
        let metrics = BridgeMetrics::new().unwrap();
        metrics.observe_actions(&[
            Action::RecordCrossing(crossing_record(1, 4, 0)),
            Action::VehicleRetired {
                vehicle_id: VehicleId(1),
                reason: RetireReason::Evicted,
            },
            Action::VehicleRetired {
                vehicle_id: VehicleId(2),
                reason: RetireReason::Stopped,
            },
            Action::VehicleRetired {
                vehicle_id: VehicleId(3),
                reason: RetireReason::Evicted,
            },
        ]);

        assert_eq!(metrics.crossings.get(), 1);
        assert_eq!(metrics.retirements.with_label_values(&["evicted"]).get(), 2);
        assert_eq!(metrics.retirements.with_label_values(&["stopped"]).get(), 1);
    }

    #[test]
    fn test_snapshot_drives_gauges() {
        let metrics = BridgeMetrics::new().unwrap();
        let mut arbiter = BridgeArbiter::new(ArbiterConfig::default());
        arbiter.register(Direction::North, 10, None).unwrap();
        arbiter.register(Direction::South, 5, None).unwrap();
        arbiter.register(Direction::South, 5, None).unwrap();

        metrics.observe_snapshot(&arbiter.snapshot());
        assert_eq!(metrics.admissions.get(), 1);
        assert_eq!(metrics.busy.get(), 1);
        assert_eq!(metrics.queue_depth.with_label_values(&["SOUTH"]).get(), 2);
        assert_eq!(metrics.queue_depth.with_label_values(&["NORTH"]).get(), 0);
        assert_eq!(metrics.live_vehicles.get(), 3);

        // Re-observing the same snapshot does not double count.
        metrics.observe_snapshot(&arbiter.snapshot());
        assert_eq!(metrics.admissions.get(), 1);

        arbiter.set_time(secs(4));
        arbiter.handle(onelane_core::Event::SchedulerTick);
        metrics.observe_snapshot(&arbiter.snapshot());
        assert_eq!(metrics.admissions.get(), 2);
        assert_eq!(metrics.queue_depth.with_label_values(&["SOUTH"]).get(), 1);
    }

    #[test]
    fn test_render_lists_every_metric() {
        let metrics = BridgeMetrics::new().unwrap();
        let text = metrics.render().unwrap();
        for name in [
            "onelane_admissions_total",
            "onelane_crossings_completed_total",
            "onelane_vehicles_retired_total{reason=\"evicted\"}",
            "onelane_journal_errors_total",
            "onelane_queue_depth{direction=\"NORTH\"}",
            "onelane_bridge_busy",
            "onelane_live_vehicles",
        ] {
            assert!(text.contains(name), "missing {} in:\n{}", name, text);
        }
    }
}
