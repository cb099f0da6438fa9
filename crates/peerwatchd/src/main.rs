//! Network peer monitoring daemon.
//!
//! Binds the control socket and serves configuration requests from
//! `peerwatchctl` and other local clients.

mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use peerwatch_control::{ControlConfig, ControlServer, DEFAULT_SOCKET_PATH};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::store::MonitorStore;

/// Network peer monitoring daemon.
#[derive(Parser)]
#[command(name = "peerwatchd")]
#[command(about = "Network peer monitoring daemon", long_about = None)]
struct Cli {
    /// Control socket path.
    #[arg(short, long, default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,

    /// Maximum number of simultaneous control clients.
    #[arg(long, default_value = "64")]
    max_clients: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "peerwatchd=info,peerwatch_control=info"
                .parse()
                .expect("valid filter")
        }))
        .with(fmt::layer())
        .init();

    info!("Starting peerwatchd");

    let config = ControlConfig::new(&cli.socket).with_max_clients(cli.max_clients);
    let mut server = ControlServer::new(config, MonitorStore::new())
        .with_context(|| format!("Failed to open control socket {}", cli.socket.display()))?;

    server.run().context("Control loop failed")
}
