//! A single simulated vehicle.

use crate::client::{BridgeClient, ClientError};
use crate::config::VehicleConfig;
use crate::report::format_vehicle_stats;
use onelane_types::{VehicleId, VehicleStats, VehicleStatus};
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a vehicle's run ended.
#[derive(Debug, Clone)]
pub struct VehicleOutcome {
    pub id: VehicleId,
    pub token: String,
    /// Final stats, if the server still had them.
    pub stats: Option<VehicleStats>,
    pub elapsed: Duration,
    /// The server evicted the vehicle before it was stopped.
    pub expired: bool,
}

/// Registers, keeps its session alive, and watches its own state until
/// cancelled or retired.
pub struct SimulatedVehicle {
    client: BridgeClient,
    config: VehicleConfig,
}

/// Random correlation token, in the spirit of a client-side UUID.
pub fn generate_token() -> String {
    format!("car-{:016x}", rand::random::<u64>())
}

impl SimulatedVehicle {
    pub fn new(config: VehicleConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: BridgeClient::new(config.endpoint.clone())?,
            config,
        })
    }

    /// Run until `cancel` fires, the vehicle retires, or its session expires.
    ///
    /// On cancellation the vehicle asks to stop; the final stats are fetched
    /// either way.
    pub async fn run(self, cancel: CancellationToken) -> Result<VehicleOutcome, ClientError> {
        let started = Instant::now();
        let token = self.config.token.clone().unwrap_or_else(generate_token);

        let registered = self
            .client
            .register(self.config.direction, self.config.speed, Some(token.clone()))
            .await?;
        let id = registered.vehicle.id;
        info!(
            vehicle_id = id.0,
            token = %token,
            direction = %self.config.direction,
            speed = self.config.speed,
            bridge_busy = registered.bridge.busy,
            "Registered"
        );
        self.announce(&token, format!("registered as {}", id));

        let mut heartbeat = interval(self.config.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut poll = interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut status = registered.vehicle.status;
        self.announce(&token, format!("{}", status));
        let mut next_report = self.config.stats_every;
        let mut expired = false;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                _ = heartbeat.tick() => match self.client.heartbeat(id).await {
                    Ok(()) => {}
                    Err(e) if e.is_expired() || e.is_not_found() => {
                        warn!(vehicle_id = id.0, "Session expired");
                        expired = true;
                        break;
                    }
                    Err(e) => warn!(vehicle_id = id.0, error = %e, "Heartbeat failed, retrying"),
                },

                _ = poll.tick() => match self.client.vehicle(id).await {
                    Ok(vehicle) => {
                        if vehicle.status != status {
                            self.announce(&token, format!("{} -> {}", status, vehicle.status));
                            if status == VehicleStatus::Crossing {
                                next_report = self.maybe_report(id, &token, started, next_report).await;
                            }
                            status = vehicle.status;
                        }
                        if status == VehicleStatus::Retired {
                            break;
                        }
                    }
                    Err(e) if e.is_expired() || e.is_not_found() => {
                        expired = true;
                        break;
                    }
                    Err(e) => debug!(vehicle_id = id.0, error = %e, "Status poll failed"),
                },
            }
        }

        if !expired && status != VehicleStatus::Retired {
            match self.client.stop(id).await {
                Ok(()) => info!(vehicle_id = id.0, "Stop requested"),
                Err(e) => warn!(vehicle_id = id.0, error = %e, "Stop request failed"),
            }
        }

        let stats = self.client.stats(id).await.ok();
        let elapsed = started.elapsed();
        if let (Some(stats), true) = (&stats, self.config.verbose) {
            println!("\n{}\n", format_vehicle_stats(id, &token, elapsed, stats));
        }

        Ok(VehicleOutcome {
            id,
            token,
            stats,
            elapsed,
            expired,
        })
    }

    /// Print stats when the crossing count reaches `next_report`. Returns
    /// the next threshold.
    async fn maybe_report(
        &self,
        id: VehicleId,
        token: &str,
        started: Instant,
        next_report: u64,
    ) -> u64 {
        if next_report == 0 {
            return 0;
        }
        match self.client.stats(id).await {
            Ok(stats) if stats.total_crossings >= next_report => {
                if self.config.verbose {
                    println!(
                        "\n{}\n",
                        format_vehicle_stats(id, token, started.elapsed(), &stats)
                    );
                }
                next_report + self.config.stats_every
            }
            Ok(_) => next_report,
            Err(e) => {
                debug!(vehicle_id = id.0, error = %e, "Stats fetch failed");
                next_report
            }
        }
    }

    fn announce(&self, token: &str, message: String) {
        if self.config.verbose {
            println!("[{}] {}", token, message);
        }
    }
}
