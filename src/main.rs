//! dualserve: demo HTTP service over plaintext and TLS.
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │                  DUALSERVE                    │
//!                 │                                               │
//!   startup ──────┼─▶ backend ──▶ generate ──▶ store ──▶ bundle   │
//!                 │   selector     (native /    (PEM on           │
//!                 │                 openssl)     disk)            │
//!                 │                                 │             │
//!                 │                                 ▼             │
//!   HTTP :4567 ───┼─────────────▶ ┌──────────────────────┐        │
//!                 │               │     shared router     │       │
//!   HTTPS :4568 ──┼─────────────▶ │ index / proxy / 404   │       │
//!                 │               └──────────────────────┘        │
//!                 └──────────────────────────────────────────────┘
//! ```
//!
//! The certificate bundle is provisioned once, before either listener
//! accepts; a bootstrap failure aborts the process instead of serving
//! TLS-less traffic on the TLS port.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dualserve::config::loader::load_config;
use dualserve::config::ServerConfig;
use dualserve::lifecycle;

#[derive(Parser, Debug)]
#[command(name = "dualserve", about = "Demo HTTP service over plaintext and TLS")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when absent.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the plaintext port.
    #[arg(long)]
    plain_port: Option<u16>,

    /// Override the TLS port.
    #[arg(long)]
    tls_port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load configuration from {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.plain_port {
        config.listener.plain_port = port;
    }
    if let Some(port) = cli.tls_port {
        config.listener.tls_port = port;
    }

    // Initialize tracing subscriber; RUST_LOG wins over the configured filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&config.observability.log_filter)
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("dualserve v0.1.0 starting");

    tracing::info!(
        bind_host = %config.listener.bind_host,
        plain_port = config.listener.plain_port,
        tls_port = config.listener.tls_port,
        key_path = %config.tls.key_path,
        cert_path = %config.tls.cert_path,
        "Configuration loaded"
    );

    if let Err(e) = lifecycle::run(config).await {
        tracing::error!(error = %e, "startup failed");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}
