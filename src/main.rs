//! BioCoin payment API server.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  BIOCOIN API                      │
//!                        │                                                   │
//!   Client Request       │  ┌─────────┐    ┌──────────┐    ┌─────────────┐  │
//!   ─────────────────────┼─▶│  http   │───▶│   auth   │───▶│  handlers   │  │
//!                        │  │ layers  │    │middleware│    │transactions │  │
//!                        │  └─────────┘    └──────────┘    └──────┬──────┘  │
//!                        │                                        │         │
//!                        │                   ┌────────────────────┴──┐      │
//!                        │                   ▼                       ▼      │
//!                        │          ┌────────────────┐     ┌─────────────┐  │
//!                        │          │   dispatcher   │     │ aggregator  │  │
//!                        │          └───────┬────────┘     └──────┬──────┘  │
//!                        │                  └──────┬──────────────┘         │
//!                        │                         ▼                        │
//!                        │                ┌─────────────────┐               │
//!                        │                │  ChainRegistry  │               │
//!                        │                │ solana │  bsc   │───────────────┼──▶ JSON-RPC
//!                        │                └─────────────────┘               │
//!                        │                                                   │
//!                        │  Cross-cutting: config, observability,            │
//!                        │  lifecycle (startup/shutdown), ledger             │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use biocoin_api::config::{load_config, load_from_env};
use biocoin_api::http::HttpServer;
use biocoin_api::lifecycle::signals::spawn_signal_handler;
use biocoin_api::lifecycle::startup::{build_registry, load_credentials, open_ledger};
use biocoin_api::lifecycle::Shutdown;
use biocoin_api::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "biocoin-api", version, about = "BioCoin multi-chain payment API")]
struct Args {
    /// TOML configuration file; defaults and environment variables apply without it
    #[arg(short, long, env = "BIOCOIN_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "biocoin-api starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = config.environment.as_str(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let registry = build_registry(&config.chains).await?;
    let credentials = load_credentials(&config.chains, |key| std::env::var(key).ok());
    let ledger = open_ledger(&config.ledger)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, registry, ledger.clone(), credentials);
    server.run(listener, shutdown.wait()).await?;

    if let Err(e) = ledger.save_to_file() {
        tracing::error!(error = %e, "Failed to save transaction ledger");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
