//! Driver configuration.

use onelane_types::Direction;
use std::time::Duration;

/// Configuration for one simulated vehicle.
#[derive(Debug, Clone)]
pub struct VehicleConfig {
    /// Server base URL.
    pub endpoint: String,

    pub direction: Direction,

    /// Raw speed; validated by the server.
    pub speed: i64,

    /// Correlation token. Generated when absent.
    pub token: Option<String>,

    /// Heartbeat period. Must stay well under the server's timeout.
    pub heartbeat_interval: Duration,

    /// How often the vehicle polls its own record.
    pub poll_interval: Duration,

    /// Print stats after every this many crossings; 0 disables.
    pub stats_every: u64,

    /// Print state transitions to stdout.
    pub verbose: bool,
}

impl VehicleConfig {
    /// Create a config with default intervals.
    pub fn new(endpoint: impl Into<String>, direction: Direction, speed: i64) -> Self {
        Self {
            endpoint: endpoint.into(),
            direction,
            speed,
            token: None,
            heartbeat_interval: Duration::from_secs(1),
            poll_interval: Duration::from_millis(500),
            stats_every: 5,
            verbose: true,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_stats_every(mut self, crossings: u64) -> Self {
        self.stats_every = crossings;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Configuration for a swarm of random vehicles.
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    pub endpoint: String,

    /// Number of vehicles to launch.
    pub vehicles: usize,

    /// How long to run before stopping every vehicle.
    pub duration: Duration,

    /// Inclusive speed range vehicles are drawn from.
    pub min_speed: i64,
    pub max_speed: i64,

    /// Fraction of vehicles heading north (0.0 to 1.0).
    pub north_ratio: f64,
}

impl SwarmConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            vehicles: 10,
            duration: Duration::from_secs(60),
            min_speed: 1,
            max_speed: 10,
            north_ratio: 0.5,
        }
    }

    pub fn with_vehicles(mut self, vehicles: usize) -> Self {
        self.vehicles = vehicles;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the speed range. Bounds are clamped to `[1, 10]` and swapped if
    /// given in the wrong order.
    pub fn with_speed_range(mut self, min: i64, max: i64) -> Self {
        let (min, max) = (min.clamp(1, 10), max.clamp(1, 10));
        self.min_speed = min.min(max);
        self.max_speed = min.max(max);
        self
    }

    /// Set the north ratio (0.0 to 1.0).
    pub fn with_north_ratio(mut self, ratio: f64) -> Self {
        self.north_ratio = ratio.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_defaults_mirror_heartbeat_contract() {
        let config = VehicleConfig::new("http://localhost:8050", Direction::South, 3);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(1));
        assert_eq!(config.stats_every, 5);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_swarm_speed_range_normalised() {
        let config = SwarmConfig::new("http://x").with_speed_range(12, 0);
        assert_eq!((config.min_speed, config.max_speed), (1, 10));

        let config = SwarmConfig::new("http://x").with_speed_range(7, 3);
        assert_eq!((config.min_speed, config.max_speed), (3, 7));

        assert_eq!(SwarmConfig::new("http://x").with_north_ratio(1.5).north_ratio, 1.0);
    }
}
