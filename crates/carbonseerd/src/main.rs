//! carbonseerd — the CarbonSeer daemon.
//!
//! Runs the carbon-aware replica controller for one deployment:
//! - periodic measure/score/decide/patch loop
//! - `POST /update_carbon` ingestion server
//! - `GET /metrics` Prometheus exposition
//!
//! # Usage
//!
//! ```text
//! carbonseerd --config /etc/carbonseer/carbonseer.toml
//! carbonseerd --config carbonseer.toml --once
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use carbonseer_core::ControllerConfig;
use carbonseerd::Daemon;
use carbonseerd::logging::init_tracing;

#[derive(Parser)]
#[command(name = "carbonseerd", about = "Carbon-aware replica controller")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "carbonseer.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Run a single control cycle, print its scores and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = ControllerConfig::from_file(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    info!(
        config = %cli.config.display(),
        deployment = %config.deployment,
        region = %config.region,
        "carbonseerd starting"
    );

    let daemon = Daemon::from_config(config)?;

    if cli.once {
        let report = daemon.run_once().await;
        println!("{}", serde_json::to_string_pretty(&report.scores)?);
        return Ok(());
    }

    // ── Shutdown signal ────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Keep the sender alive so the daemon runs until killed.
                error!(error = %e, "failed to install CTRL+C handler");
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    daemon.run(shutdown_rx).await
}
