//! tiersyncd — the TierSync daemon.
//!
//! Single binary that assembles the TierSync subsystems:
//! - State store (redb)
//! - Tier reconciler (admission scheduler)
//! - Reconcile runner (event loop + periodic resync)
//!
//! # Usage
//!
//! ```text
//! tiersyncd run --data-dir /var/lib/tiersync --clusters cluster1,cluster2
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use tiersync_reconciler::{ReconcileRunner, ReconcilerConfig, TierReconciler};

#[derive(Parser)]
#[command(name = "tiersyncd", about = "TierSync daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the reconcile loop over a local state store.
    Run {
        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/tiersync")]
        data_dir: PathBuf,

        /// Target clusters records may be provisioned on (comma-separated).
        #[arg(long, value_delimiter = ',', required = true)]
        clusters: Vec<String>,

        /// Cap on live work items per tier.
        #[arg(long, default_value = "5")]
        max_pool_size: u32,

        /// Records requested per page during fleet scans.
        #[arg(long, default_value = "100")]
        page_limit: u32,

        /// Safety-net resync interval in seconds.
        #[arg(long, default_value = "300")]
        resync_interval: u64,

        /// Backoff before retrying a transiently failed pass, in seconds.
        #[arg(long, default_value = "5")]
        retry_backoff: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tiersyncd=debug,tiersync=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            data_dir,
            clusters,
            max_pool_size,
            page_limit,
            resync_interval,
            retry_backoff,
        } => {
            run(
                data_dir,
                clusters,
                ReconcilerConfig {
                    max_pool_size,
                    page_limit,
                },
                Duration::from_secs(resync_interval),
                Duration::from_secs(retry_backoff),
            )
            .await
        }
    }
}

async fn run(
    data_dir: PathBuf,
    clusters: Vec<String>,
    config: ReconcilerConfig,
    resync_interval: Duration,
    retry_backoff: Duration,
) -> anyhow::Result<()> {
    info!("TierSync daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("tiersync.redb");

    // State store.
    let state = tiersync_state::StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    // Reconciler + runner.
    let reconciler = TierReconciler::new(state, clusters, config);
    let (runner, events) = ReconcileRunner::new(reconciler, retry_backoff, resync_interval);
    info!(
        resync_secs = resync_interval.as_secs(),
        "reconcile runner initialized"
    );

    // ── Shutdown signal ────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let runner_handle = tokio::spawn(runner.run(shutdown_rx));

    // The event handle is what a change-notification subscription would
    // feed; until one is wired up, the resync sweep drives everything.
    drop(events);

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    runner_handle.await?;

    info!("TierSync daemon stopped");
    Ok(())
}
