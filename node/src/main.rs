//! Arden Node - delegate node entry point.
//!
//! Wires the peer-health monitor and the consensus query surface around
//! development-mode collaborators and runs until interrupted. The real
//! chain, pool and transport plug into the same seams later without
//! changing the wiring here.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use arden_p2p::{ConsensusApi, NetworkMonitor, PeerProcessor, PeerRegistry, SystemClock};

mod config;
mod dev;

use config::NodeConfig;
use dev::{DevChainStore, EmptyTransactionPool, LogEventPublisher, UnreachablePeerContact};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Parse command line arguments
    let matches = Command::new("arden-node")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Arden delegate node")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to the node configuration file")
                .default_value("arden.toml"),
        )
        .arg(
            Arg::new("test-mode")
                .long("test-mode")
                .help("Report full quorum regardless of peer state")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("refresh-interval")
                .long("refresh-interval")
                .value_name("MILLIS")
                .help("Override the monitor refresh interval"),
        )
        .get_matches();

    let config_path = PathBuf::from(matches.get_one::<String>("config").unwrap());
    let mut config = if config_path.exists() {
        NodeConfig::load_from_file(&config_path)?
    } else {
        warn!(
            "Config file {} not found, falling back to the dev preset",
            config_path.display()
        );
        NodeConfig::dev()
    };

    // Override with command line parameters
    if matches.get_flag("test-mode") {
        config.p2p.test_mode = true;
    }
    if let Some(raw) = matches.get_one::<String>("refresh-interval") {
        config.p2p.refresh_interval_ms = raw
            .parse()
            .context("--refresh-interval must be a number of milliseconds")?;
    }
    config.validate()?;

    info!("🚀 Starting {}", config.node.name);
    info!("Advertised endpoint: {}", config.p2p.advertised_socket());
    info!("Delegates configured: {}", config.delegates.len());
    if config.p2p.test_mode {
        info!("Test mode: quorum checks are bypassed");
    }

    // Run the node
    if let Err(e) = run_node(config).await {
        error!("❌ Node failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run_node(config: NodeConfig) -> Result<()> {
    let epoch = config.epoch_unix_secs()?;
    let delegate_keys = config.delegate_keys()?;

    // Development collaborators; each one swaps for a real implementation
    // at the same seam.
    let chain = Arc::new(DevChainStore::new(delegate_keys));
    let pool = Arc::new(EmptyTransactionPool);
    let publisher = Arc::new(LogEventPublisher);
    let contact = Arc::new(UnreachablePeerContact);
    let clock = Arc::new(SystemClock::new(epoch));

    let registry = Arc::new(PeerRegistry::new(&config.p2p));
    let processor = Arc::new(PeerProcessor::new(
        Arc::clone(&registry),
        publisher.clone(),
        &config.p2p,
    ));
    let monitor = Arc::new(NetworkMonitor::new(
        Arc::clone(&registry),
        contact,
        chain.clone(),
        publisher.clone(),
        &config.p2p,
    ));
    let api = ConsensusApi::new(
        processor,
        Arc::clone(&monitor),
        chain,
        pool,
        publisher,
        clock,
        config.slots,
        &config.p2p,
    );

    monitor.start();

    // Setup status reporting, one report per monitor cycle
    let status_handle =
        start_status_reporting(api, Arc::clone(&registry), config.p2p.refresh_interval_ms);

    info!("✅ {} started", config.node.name);

    // Wait for shutdown signal
    let mut term_signal = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("failed to install SIGTERM handler")?;
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("📶 Received shutdown signal (Ctrl+C)");
        }
        _ = term_signal.recv() => {
            info!("📶 Received shutdown signal (SIGTERM)");
        }
    }

    info!("🛑 Stopping network monitor...");
    status_handle.abort();
    monitor.stop();

    info!("✅ {} stopped gracefully", config.node.name);
    Ok(())
}

fn start_status_reporting(
    api: ConsensusApi,
    registry: Arc<PeerRegistry>,
    interval_ms: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));

        loop {
            interval.tick().await;

            let state = api.network_state().await;
            let known_peers = registry.count().await;

            info!("📊 Network state report");
            info!("├─ Status: {} (quorum {:.2})", state.status, state.quorum);
            info!("├─ Peers: {} known, {} in sample", known_peers, state.sample_size);
            info!(
                "├─ Height: {} local, {} median",
                state.local_height, state.median_height
            );
            match api.current_round().await {
                Ok(round) => info!(
                    "└─ Round {}: forger {}, window {}",
                    round.round,
                    round.current_forger.public_key,
                    if round.can_forge { "open" } else { "closed" }
                ),
                Err(e) => info!("└─ Round unavailable: {}", e),
            }

            if !state.over_height.is_empty() {
                warn!(
                    "⚠️  {} peer(s) claim heights above local + tolerance",
                    state.over_height.len()
                );
            }
        }
    })
}
