//! Many random vehicles at once.

use crate::client::ClientError;
use crate::config::{SwarmConfig, VehicleConfig};
use crate::report::SwarmReport;
use crate::vehicle::SimulatedVehicle;
use onelane_types::Direction;
use rand::Rng;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Launches [`SwarmConfig::vehicles`] vehicles and stops them all after
/// [`SwarmConfig::duration`].
pub struct Swarm {
    config: SwarmConfig,
}

impl Swarm {
    pub fn new(config: SwarmConfig) -> Self {
        Self { config }
    }

    /// Draw a direction and speed for every vehicle.
    pub fn plan<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<VehicleConfig> {
        (0..self.config.vehicles)
            .map(|_| {
                let direction = if rng.gen_bool(self.config.north_ratio) {
                    Direction::North
                } else {
                    Direction::South
                };
                let speed = rng.gen_range(self.config.min_speed..=self.config.max_speed);
                VehicleConfig::new(self.config.endpoint.clone(), direction, speed)
                    .with_stats_every(0)
                    .with_verbose(false)
            })
            .collect()
    }

    /// Run the swarm. Cancelling `cancel` ends it early.
    pub async fn run(&self, cancel: CancellationToken) -> Result<SwarmReport, ClientError> {
        let plan = self.plan(&mut rand::thread_rng());
        let started = Instant::now();
        let stop = cancel.child_token();

        let mut tasks = JoinSet::new();
        for config in plan {
            info!(direction = %config.direction, speed = config.speed, "Launching vehicle");
            let vehicle = SimulatedVehicle::new(config)?;
            tasks.spawn(vehicle.run(stop.clone()));
        }

        tokio::select! {
            _ = tokio::time::sleep(self.config.duration) => {}
            _ = cancel.cancelled() => {}
        }
        stop.cancel();

        let mut report = SwarmReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(outcome)) => match &outcome.stats {
                    Some(stats) => report.add(stats),
                    None => report.add_failure(),
                },
                Ok(Err(e)) => {
                    warn!(error = %e, "Vehicle failed");
                    report.add_failure();
                }
                Err(e) => {
                    warn!(error = %e, "Vehicle task panicked");
                    report.add_failure();
                }
            }
        }
        report.elapsed = started.elapsed();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_plan_respects_ranges() {
        let swarm = Swarm::new(
            SwarmConfig::new("http://localhost:8050")
                .with_vehicles(50)
                .with_speed_range(3, 6)
                .with_north_ratio(1.0),
        );
        let plan = swarm.plan(&mut StdRng::seed_from_u64(7));

        assert_eq!(plan.len(), 50);
        for config in &plan {
            assert_eq!(config.direction, Direction::North);
            assert!((3..=6).contains(&config.speed));
            assert!(!config.verbose);
        }
    }

    #[test]
    fn test_plan_is_deterministic_per_seed() {
        let swarm = Swarm::new(SwarmConfig::new("http://x").with_vehicles(8));
        let a = swarm.plan(&mut StdRng::seed_from_u64(1));
        let b = swarm.plan(&mut StdRng::seed_from_u64(1));
        let key = |p: &[VehicleConfig]| p.iter().map(|c| (c.direction, c.speed)).collect::<Vec<_>>();
        assert_eq!(key(&a), key(&b));
    }
}
