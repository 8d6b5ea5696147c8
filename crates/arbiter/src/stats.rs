//! Crossing history and per-vehicle statistics.

use onelane_types::{CrossingRecord, VehicleId, VehicleStats};
use std::collections::HashMap;
use std::time::Duration;

/// Append-only store of crossing records.
///
/// Records are never mutated or deleted; every metric is folded from them
/// on demand.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    records: Vec<CrossingRecord>,
    /// vehicle -> indexes into `records`
    by_vehicle: HashMap<VehicleId, Vec<usize>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed crossing.
    pub fn record(&mut self, record: CrossingRecord) {
        self.by_vehicle
            .entry(record.vehicle_id)
            .or_default()
            .push(self.records.len());
        self.records.push(record);
    }

    /// All records for one vehicle, oldest first.
    pub fn records_for(&self, vehicle_id: VehicleId) -> impl Iterator<Item = &CrossingRecord> {
        self.by_vehicle
            .get(&vehicle_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.records[i])
    }

    /// Fold a vehicle's records into its stats.
    ///
    /// A vehicle without records gets zeroed stats.
    pub fn compute(&self, vehicle_id: VehicleId) -> VehicleStats {
        let (count, on_bridge, waiting) = self.records_for(vehicle_id).fold(
            (0u64, Duration::ZERO, Duration::ZERO),
            |(count, on_bridge, waiting), r| (count + 1, on_bridge + r.crossing, waiting + r.waiting),
        );

        let on_bridge = on_bridge.as_secs_f64();
        let waiting = waiting.as_secs_f64();
        let average = |total: f64| if count == 0 { 0.0 } else { total / count as f64 };
        let accounted = on_bridge + waiting;

        VehicleStats {
            total_crossings: count,
            total_time_on_bridge_sec: on_bridge,
            avg_crossing_time_sec: average(on_bridge),
            total_waiting_time_sec: waiting,
            avg_waiting_time_sec: average(waiting),
            time_in_bridge_percent: if accounted > 0.0 {
                on_bridge / accounted * 100.0
            } else {
                0.0
            },
        }
    }

    /// Total number of records across all vehicles.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn all(&self) -> &[CrossingRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onelane_test_helpers::{crossing_record, secs};

    #[test]
    fn test_zeroed_stats_without_records() {
        let stats = StatsAggregator::new();
        assert_eq!(stats.compute(VehicleId(1)), VehicleStats::default());
    }

    #[test]
    fn test_totals_and_averages() {
        let mut stats = StatsAggregator::new();
        stats.record(crossing_record(1, 4, 2));
        stats.record(crossing_record(2, 12, 0));
        stats.record(crossing_record(1, 4, 6));

        let s = stats.compute(VehicleId(1));
        assert_eq!(s.total_crossings, 2);
        assert_eq!(s.total_time_on_bridge_sec, 8.0);
        assert_eq!(s.avg_crossing_time_sec, 4.0);
        assert_eq!(s.total_waiting_time_sec, 8.0);
        assert_eq!(s.avg_waiting_time_sec, 4.0);
        assert_eq!(s.time_in_bridge_percent, 50.0);

        let total: Duration = stats.records_for(VehicleId(1)).map(|r| r.crossing).sum();
        assert_eq!(total, secs(8));
        assert_eq!(stats.len(), 3);
    }

    #[test]
    fn test_percent_without_waiting_is_full() {
        let mut stats = StatsAggregator::new();
        stats.record(crossing_record(2, 12, 0));

        let s = stats.compute(VehicleId(2));
        assert_eq!(s.time_in_bridge_percent, 100.0);
        assert!((0.0..=100.0).contains(&s.time_in_bridge_percent));
    }
}
