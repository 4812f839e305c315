//! Vision Proxy
//!
//! Validates image-analysis requests, forwards them to the vision service and
//! translates its answers into one stable JSON envelope.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                     VISION PROXY                      │
//!   POST /url         │  ┌──────────┐   ┌───────────┐   ┌───────────┐        │
//!   POST /upload ─────┼─▶│  http    │──▶│ validator │──▶│ forwarder │────────┼──▶ Vision
//!                     │  │ handlers │   │ + sanitize│   │ 30s limit │        │    Service
//!                     │  └──────────┘   └─────┬─────┘   └─────┬─────┘        │
//!                     │                       │ rejection     │ Ok / Err     │
//!                     │                       ▼               ▼              │
//!   JSON envelope ◀───┼───────────────── translator ◀─────────┘              │
//!                     │                                                      │
//!                     │   config · observability · security · lifecycle      │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use vision_proxy::config::{load_config, validation::config_warnings};
use vision_proxy::lifecycle::signals::wait_for_termination;
use vision_proxy::observability::{logging, metrics};
use vision_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "vision-proxy")]
#[command(about = "Validating proxy for an image-analysis API", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "VISION_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address, overriding config and environment.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("vision-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    for warning in config_warnings(&config) {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoint = %config.upstream.endpoint,
        timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config)?;
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        wait_for_termination().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
