//! Human-readable stats output.

use onelane_types::{VehicleId, VehicleStats};
use std::fmt::Write;
use std::time::Duration;

/// Render one vehicle's stats block.
pub fn format_vehicle_stats(
    id: VehicleId,
    token: &str,
    elapsed: Duration,
    stats: &VehicleStats,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== VEHICLE STATS ===");
    let _ = writeln!(out, "Vehicle:                 {} ({})", id, token);
    let _ = writeln!(out, "Simulation time:         {}s", elapsed.as_secs());
    let _ = writeln!(out, "Crossings:               {}", stats.total_crossings);
    let _ = writeln!(out, "Time on bridge:          {:.1}s", stats.total_time_on_bridge_sec);
    let _ = writeln!(out, "Average crossing:        {:.1}s", stats.avg_crossing_time_sec);
    let _ = writeln!(out, "Time waiting:            {:.1}s", stats.total_waiting_time_sec);
    let _ = writeln!(out, "Average wait:            {:.1}s", stats.avg_waiting_time_sec);
    let _ = writeln!(out, "Time on bridge (%):      {:.1}%", stats.time_in_bridge_percent);
    let _ = write!(out, "=====================");
    out
}

/// Aggregate over every vehicle a swarm launched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwarmReport {
    pub vehicles: usize,
    /// Vehicles whose final stats could not be fetched.
    pub failed: usize,
    pub total_crossings: u64,
    pub total_time_on_bridge_sec: f64,
    pub total_waiting_time_sec: f64,
    pub elapsed: Duration,
}

impl SwarmReport {
    /// Fold one vehicle's final stats in.
    pub fn add(&mut self, stats: &VehicleStats) {
        self.vehicles += 1;
        self.total_crossings += stats.total_crossings;
        self.total_time_on_bridge_sec += stats.total_time_on_bridge_sec;
        self.total_waiting_time_sec += stats.total_waiting_time_sec;
    }

    pub fn add_failure(&mut self) {
        self.vehicles += 1;
        self.failed += 1;
    }

    pub fn avg_crossing_time_sec(&self) -> f64 {
        if self.total_crossings == 0 {
            0.0
        } else {
            self.total_time_on_bridge_sec / self.total_crossings as f64
        }
    }

    pub fn avg_waiting_time_sec(&self) -> f64 {
        if self.total_crossings == 0 {
            0.0
        } else {
            self.total_waiting_time_sec / self.total_crossings as f64
        }
    }

    /// Share of the run the lane was occupied.
    pub fn lane_utilisation_percent(&self) -> f64 {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed == 0.0 {
            0.0
        } else {
            (self.total_time_on_bridge_sec / elapsed * 100.0).min(100.0)
        }
    }

    pub fn print(&self) {
        println!("\n=== SWARM REPORT ===");
        println!("Duration:           {:.1}s", self.elapsed.as_secs_f64());
        println!("Vehicles:           {} ({} without stats)", self.vehicles, self.failed);
        println!("Crossings:          {}", self.total_crossings);
        println!("Average crossing:   {:.1}s", self.avg_crossing_time_sec());
        println!("Average wait:       {:.1}s", self.avg_waiting_time_sec());
        println!("Lane utilisation:   {:.1}%", self.lane_utilisation_percent());
        println!("====================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(crossings: u64, on_bridge: f64, waiting: f64) -> VehicleStats {
        VehicleStats {
            total_crossings: crossings,
            total_time_on_bridge_sec: on_bridge,
            total_waiting_time_sec: waiting,
            ..VehicleStats::default()
        }
    }

    #[test]
    fn test_swarm_report_averages() {
        let mut report = SwarmReport {
            elapsed: Duration::from_secs(40),
            ..SwarmReport::default()
        };
        report.add(&stats(2, 8.0, 4.0));
        report.add(&stats(1, 12.0, 2.0));
        report.add_failure();

        assert_eq!(report.vehicles, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total_crossings, 3);
        assert!((report.avg_crossing_time_sec() - 20.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.avg_waiting_time_sec(), 2.0);
        assert_eq!(report.lane_utilisation_percent(), 50.0);
    }

    #[test]
    fn test_empty_report_has_no_nan() {
        let report = SwarmReport::default();
        assert_eq!(report.avg_crossing_time_sec(), 0.0);
        assert_eq!(report.lane_utilisation_percent(), 0.0);
    }

    #[test]
    fn test_vehicle_stats_block() {
        let text = format_vehicle_stats(
            VehicleId(3),
            "car-3",
            Duration::from_secs(30),
            &stats(1, 4.0, 0.0),
        );
        assert!(text.contains("Vehicle(3) (car-3)"));
        assert!(text.contains("Crossings:               1"));
        assert!(text.contains("Time on bridge:          4.0s"));
    }
}
