//! Custody daemon: resolves configuration, starts logging, serves the API.

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use custody_rpc::{AppState, RpcServer};
use custody_utils::{init_logging, LogFormat};
use custody_wallet_core::{HorizonClient, SystemClock, Wallet};
use tracing::info;

use crate::config::{DaemonConfig, FileConfig, Overrides};

#[derive(Parser)]
#[command(name = "custody-daemon", about = "Custodial claimable-balance wallet backend")]
struct Cli {
    /// Network to use: "mainnet" or "testnet".
    #[arg(long, env = "NETWORK")]
    network: Option<String>,

    /// Base URL of the ledger's HTTP API.
    #[arg(long, env = "NET_URL")]
    horizon_url: Option<String>,

    /// Network passphrase transactions are signed for.
    #[arg(long, env = "NET_PASSPHRASE")]
    network_passphrase: Option<String>,

    /// Address to serve the HTTP API on [default: 0.0.0.0:8080].
    #[arg(long, env = "LISTEN_ADDR")]
    listen: Option<SocketAddr>,

    /// Log output: "human" or "json".
    #[arg(long, env = "LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file. Flags and environment variables
    /// override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        network: cli.network,
        horizon_url: cli.horizon_url,
        network_passphrase: cli.network_passphrase,
        listen: cli.listen,
        log_format: cli.log_format,
        log_level: cli.log_level,
    };
    let config = DaemonConfig::resolve(overrides, file).context("invalid configuration")?;

    init_logging(config.log_format, &config.log_level).context("failed to initialise logging")?;
    info!(
        network = %config.ledger.network,
        horizon_url = %config.ledger.horizon_url,
        "starting custody daemon"
    );

    let ledger = HorizonClient::new(&config.ledger).context("failed to create ledger client")?;
    let state = AppState {
        wallet: Wallet::new(ledger, &config.ledger),
        clock: Arc::new(SystemClock),
    };

    RpcServer::new(config.listen, state)
        .start()
        .await
        .context("HTTP server failed")?;
    Ok(())
}
