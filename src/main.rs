//! Keyed forward proxy.
//!
//! ```text
//!     Client ──▶ /proxy?url=… ──▶ authenticate ──▶ parse target ──▶ whitelist
//!                                                                     │
//!     Client ◀── filtered response ◀── upstream ◀── filter ◀── rate limit
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use keyed_proxy::config::load_config;
use keyed_proxy::lifecycle::signals::shutdown_on_signal;
use keyed_proxy::observability::logging::init_logging;
use keyed_proxy::observability::metrics::init_metrics;
use keyed_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "keyed-proxy")]
#[command(about = "Authenticated, whitelisted, rate-limited forward proxy", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability.log_level);

    tracing::info!("keyed-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        whitelisted_hosts = config.whitelist.hosts.len(),
        max_requests_per_minute = config.rate_limit.max_requests_per_minute,
        allowed_origin = ?config.response.allowed_origin,
        upstream_timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );
    if config.whitelist.hosts.is_empty() {
        tracing::warn!("Whitelist is empty; every target will be rejected");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => init_metrics(addr),
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
    let receiver = shutdown.subscribe();
    let signal_handle = shutdown.clone();
    tokio::spawn(async move { shutdown_on_signal(&signal_handle).await });

    let server = HttpServer::new(config)?;
    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
