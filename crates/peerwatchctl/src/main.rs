//! `peerwatchd` administration CLI.
//!
//! Provides commands for registering monitored peers and watching
//! state-change notifications over the daemon's control socket.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use peerwatch_client::{Client, ClientConfig, SubscriptionMask};

/// `peerwatchd` administration CLI.
#[derive(Parser)]
#[command(name = "peerwatchctl")]
#[command(about = "peerwatchd administration CLI", long_about = None)]
struct Cli {
    /// Control socket path.
    #[arg(short, long, default_value = "/var/run/peerwatchd.sock")]
    socket: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring a peer.
    Add {
        /// Peer described as a JSON document.
        spec: String,
    },

    /// Stop monitoring a peer.
    Del {
        /// Peer described as a JSON document.
        spec: String,
    },

    /// Subscribe to state-change notifications and print them.
    Subscribe {
        /// Subscription mask bits.
        #[arg(short, long, default_value = "1")]
        mask: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Subscriptions wait indefinitely for the next notification
    let config = if matches!(&cli.command, Commands::Subscribe { .. }) {
        ClientConfig {
            read_timeout: None,
            ..Default::default()
        }
    } else {
        ClientConfig::default()
    };

    let mut client = Client::connect(&cli.socket, config)
        .with_context(|| format!("Failed to connect to {}", cli.socket))?;

    match cli.command {
        Commands::Add { spec } => {
            client.request_add(&spec)?;
            println!("Added: {spec}");
        }

        Commands::Del { spec } => {
            client.request_del(&spec)?;
            println!("Removed: {spec}");
        }

        Commands::Subscribe { mask } => {
            let mask = SubscriptionMask::new(mask);
            client.subscribe(mask)?;
            eprintln!("Subscribed with mask {mask}");

            loop {
                let frame = client.read_notification()?;
                println!("{}", String::from_utf8_lossy(&frame.payload));
            }
        }
    }

    Ok(())
}
