//! Arbiter configuration.

use serde::Deserialize;
use std::time::Duration;

/// Direction-fairness thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FairnessConfig {
    /// Maximum consecutive admissions from one direction while the opposite
    /// queue is non-empty. Values below 1 are treated as 1.
    pub max_consecutive: u32,

    /// Switch direction as soon as the opposite head has waited longer than this.
    #[serde(with = "humantime_serde")]
    pub max_head_wait: Duration,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            max_consecutive: 3,
            max_head_wait: Duration::from_secs(30),
        }
    }
}

/// Configuration for the bridge arbiter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Delay after a crossing before the vehicle re-enters its queue.
    #[serde(with = "humantime_serde")]
    pub resting_period: Duration,

    /// Idle vehicles without a heartbeat for longer than this are evicted.
    #[serde(with = "humantime_serde")]
    pub heartbeat_timeout: Duration,

    /// How long retired vehicles stay queryable before being purged.
    #[serde(with = "humantime_serde")]
    pub retired_grace: Duration,

    /// Scheduler tick period.
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,

    /// Liveness scan period.
    #[serde(with = "humantime_serde")]
    pub liveness_interval: Duration,

    pub fairness: FairnessConfig,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            resting_period: Duration::from_secs(5),
            heartbeat_timeout: Duration::from_secs(10),
            retired_grace: Duration::from_secs(60),
            tick_interval: Duration::from_millis(250),
            liveness_interval: Duration::from_secs(1),
            fairness: FairnessConfig::default(),
        }
    }
}

impl ArbiterConfig {
    /// Set the resting period.
    pub fn with_resting_period(mut self, resting_period: Duration) -> Self {
        self.resting_period = resting_period;
        self
    }

    /// Set the heartbeat timeout.
    pub fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    /// Set the retired-record grace period.
    pub fn with_retired_grace(mut self, grace: Duration) -> Self {
        self.retired_grace = grace;
        self
    }

    /// Set the scheduler tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the fairness thresholds.
    pub fn with_fairness(mut self, fairness: FairnessConfig) -> Self {
        self.fairness = fairness;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = ArbiterConfig::default()
            .with_resting_period(Duration::from_secs(1))
            .with_heartbeat_timeout(Duration::from_secs(3));
        assert_eq!(config.resting_period, Duration::from_secs(1));
        assert_eq!(config.heartbeat_timeout, Duration::from_secs(3));
        assert_eq!(config.fairness, FairnessConfig::default());
    }
}
