//! One-lane bridge coordinator server.
//!
//! Loads configuration, replays the crossing journal, and serves the HTTP
//! API until Ctrl-C.

use anyhow::Context;
use clap::Parser;
use onelane_arbiter::BridgeArbiter;
use onelane_server::{
    init_tracing, router, BridgeRunner, CrossingJournal, ServerConfig, SystemClock,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "onelane-server")]
#[command(about = "One-lane bridge crossing coordinator")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Crossing journal path (overrides config)
    #[arg(short, long)]
    journal: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_filter).context("failed to initialise tracing")?;

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(listen) = cli.listen {
        config = config.with_listen(listen);
    }
    if let Some(journal) = cli.journal {
        config = config.with_journal(journal);
    }
    config.validate()?;

    let mut arbiter = BridgeArbiter::new(config.arbiter.clone());
    let journal = match &config.server.journal {
        Some(path) => {
            let restored = arbiter.restore_records(CrossingJournal::replay(path)?);
            info!(path = %path.display(), restored, "Replayed crossing journal");
            Some(CrossingJournal::open(path)?)
        }
        None => None,
    };

    info!(
        policy = arbiter.policy_name(),
        resting_period = ?config.arbiter.resting_period,
        heartbeat_timeout = ?config.arbiter.heartbeat_timeout,
        max_consecutive = config.arbiter.fairness.max_consecutive,
        "Arbiter configured"
    );

    let runner = BridgeRunner::new(arbiter, Arc::new(SystemClock::new()), journal)
        .context("failed to register metrics")?;
    let app = router(runner.handle());

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let runner_task = tokio::spawn(runner.run(async {
        let _ = stop_rx.await;
    }));

    let listener = tokio::net::TcpListener::bind(config.server.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen))?;
    info!(listen = %config.server.listen, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("HTTP server failed")?;

    let _ = stop_tx.send(());
    runner_task.await.context("runner task panicked")?;
    Ok(())
}
