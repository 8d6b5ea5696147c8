//! One-lane bridge driver CLI
//!
//! Simulates vehicles against a running bridge server.

use clap::{Parser, Subcommand};
use onelane_driver::client::BridgeClient;
use onelane_driver::config::{SwarmConfig, VehicleConfig};
use onelane_driver::swarm::Swarm;
use onelane_driver::vehicle::SimulatedVehicle;
use onelane_types::Direction;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "onelane-driver")]
#[command(about = "Simulated vehicles for the one-lane bridge coordinator")]
#[command(version)]
struct Cli {
    /// Server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8050", global = true)]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive one vehicle until Ctrl-C
    Vehicle {
        /// Direction (NORTH/SOUTH, NORTE/SUR)
        direction: Direction,

        /// Speed, 1 (slowest) to 10 (fastest)
        speed: i64,

        /// Correlation token; reusing one re-attaches to a live vehicle
        #[arg(long)]
        token: Option<String>,

        /// Print stats after every N crossings (0 disables)
        #[arg(long, default_value = "5")]
        stats_every: u64,

        /// Heartbeat period (e.g., "1s", "500ms")
        #[arg(long, default_value = "1s")]
        heartbeat: humantime::Duration,
    },

    /// Run many random vehicles for a fixed time
    Swarm {
        /// Number of vehicles
        #[arg(short = 'n', long, default_value = "10")]
        vehicles: usize,

        /// Duration to run (e.g., "30s", "5m", "1h")
        #[arg(short, long, default_value = "60s")]
        duration: humantime::Duration,

        /// Slowest speed drawn
        #[arg(long, default_value = "1")]
        min_speed: i64,

        /// Fastest speed drawn
        #[arg(long, default_value = "10")]
        max_speed: i64,

        /// Fraction of vehicles heading north (0.0 to 1.0)
        #[arg(long, default_value = "0.5")]
        north_ratio: f64,
    },
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    BridgeClient::new(cli.endpoint.clone())?
        .wait_for_ready(Duration::from_secs(30))
        .await?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match cli.command {
        Commands::Vehicle {
            direction,
            speed,
            token,
            stats_every,
            heartbeat,
        } => {
            let mut config = VehicleConfig::new(cli.endpoint, direction, speed)
                .with_stats_every(stats_every)
                .with_heartbeat_interval(*heartbeat);
            if let Some(token) = token {
                config = config.with_token(token);
            }

            let outcome = SimulatedVehicle::new(config)?.run(cancel).await?;
            if outcome.expired {
                println!("Session for {} expired", outcome.id);
            }
        }

        Commands::Swarm {
            vehicles,
            duration,
            min_speed,
            max_speed,
            north_ratio,
        } => {
            let config = SwarmConfig::new(cli.endpoint)
                .with_vehicles(vehicles)
                .with_duration(*duration)
                .with_speed_range(min_speed, max_speed)
                .with_north_ratio(north_ratio);

            println!("Starting swarm of {} vehicles for {:?}...", vehicles, *duration);
            let report = Swarm::new(config).run(cancel).await?;
            report.print();
        }
    }

    Ok(())
}
