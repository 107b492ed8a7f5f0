//! Liquidity gateway
//!
//! The HTTP/WebSocket front door onto the zone validator cluster (§6 of the
//! spec): terminates client connections, verifies their self-asserted
//! identity tokens, and dispatches commands through the Sharding Router to
//! per-zone validator tasks backed by a Postgres event journal.
//!
//! # Usage
//!
//! ```bash
//! liquidity-gateway
//! liquidity-gateway --config /path/to/config.toml
//! LIQUIDITY__SERVER__PORT=9090 liquidity-gateway
//! ```

mod config;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use liquidity_api::{create_router, AppState};
use liquidity_auth::IdentityVerifier;
use liquidity_router::{ShardedZoneRouter, ZoneMonitor};
use liquidity_store::SqlJournal;
use liquidity_zone::status::BroadcastStatusTopic;

use crate::config::GatewayConfig;

/// Liquidity gateway - HTTP/WebSocket front door onto the zone validator cluster
#[derive(Parser, Debug)]
#[command(name = "liquidity-gateway")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "LIQUIDITY_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "LIQUIDITY_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "LIQUIDITY_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LIQUIDITY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "LIQUIDITY_LOG_FORMAT")]
    log_format: Option<String>,

    /// PostgreSQL connection URL for the event journal
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut gateway_config = GatewayConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        gateway_config.server.host = host;
    }
    if let Some(port) = args.port {
        gateway_config.server.port = port;
    }
    if let Some(level) = args.log_level {
        gateway_config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        gateway_config.logging.format = format;
    }
    if let Some(database_url) = args.database_url {
        gateway_config.database.postgres_url = database_url;
    }

    init_logging(&gateway_config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting liquidity gateway");

    let store_config: liquidity_store::StoreConfig = (&gateway_config.database).into();
    let journal: Arc<dyn liquidity_store::EventJournal> = {
        let sql_journal = SqlJournal::connect(&store_config).await?;
        sql_journal.ensure_schema().await?;
        Arc::new(sql_journal)
    };

    let status_topic = Arc::new(BroadcastStatusTopic::default());
    let monitor = ZoneMonitor::spawn(&status_topic);
    let router = ShardedZoneRouter::new(journal.clone(), status_topic);

    let auth_config: liquidity_auth::AuthConfig = (&gateway_config.auth).into();
    let verifier = IdentityVerifier::new(auth_config);

    let state = Arc::new(AppState::new(verifier, router, monitor, journal));
    let app = create_router(state);

    let addr = gateway_config.server.socket_addr();
    tracing::info!(%addr, "gateway listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(gateway_config.server.shutdown_timeout()))
    .await?;

    tracing::info!("gateway shutdown complete");
    Ok(())
}

fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => subscriber.with(fmt::layer().json().with_target(true)).init(),
        _ => subscriber.with(fmt::layer().pretty().with_target(true)).init(),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then give in-flight requests `timeout` to
/// finish. A zone's validator task outlives this signal - passivation, not
/// process shutdown, is what stops it - so there is nothing zone-specific to
/// drain here beyond the HTTP layer itself.
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown");
        }
    }

    tracing::info!(timeout_secs = timeout.as_secs(), "waiting for in-flight requests to complete");
    tokio::time::sleep(timeout).await;
}
