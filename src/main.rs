//! udpmux binary entry point.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use udpmux::feed::FeedOptions;
use udpmux::{config, feed, gateway, relay};

/// Carry UDP and multicast packet streams across a WAN over one TCP or
/// TLS connection.
#[derive(Parser)]
#[command(name = "udpmux", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Forward packets from local UDP groups to a remote gateway.
    Relay {
        /// Path to the relay configuration file.
        config: PathBuf,
    },

    /// Accept relay connections and forward packets to local UDP groups.
    Gateway {
        /// Path to the gateway configuration file.
        config: PathBuf,
    },

    /// Send dummy packets to a UDP service.
    Feed {
        /// Send all-zero payloads instead of random ones.
        #[arg(short = 'z', long)]
        zero: bool,

        /// Payload size in bytes.
        #[arg(short = 's', long, default_value_t = 1024)]
        size: usize,

        /// Number of packets to send; 0 sends forever.
        #[arg(short = 'c', long, default_value_t = 0)]
        count: u64,

        /// Pause between packets in milliseconds.
        #[arg(short = 'p', long)]
        pause_ms: Option<u64>,

        /// Destination endpoint as host:port.
        addr: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Relay { config: path } => {
            let config = config::load_relay(&path)
                .with_context(|| format!("loading relay configuration {}", path.display()))?;
            relay::run(config).await.context("relay failed")?;
        },
        Command::Gateway { config: path } => {
            let config = config::load_gateway(&path)
                .with_context(|| format!("loading gateway configuration {}", path.display()))?;
            gateway::run(config).await.context("gateway failed")?;
        },
        Command::Feed {
            zero,
            size,
            count,
            pause_ms,
            addr,
        } => {
            let options = FeedOptions {
                zero,
                size,
                count,
                pause: pause_ms.map(Duration::from_millis),
            };
            feed::run(&addr, &options)
                .await
                .with_context(|| format!("feeding {addr}"))?;
        },
    }

    Ok(())
}
