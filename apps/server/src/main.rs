//! # Dapur Server Binary
//!
//! ```text
//! dapur-server [--config <path>]
//!
//!   config ──► Database (migrations) ──► EventHub ──► router ──► serve
//!                                                                 │
//!                                      Ctrl+C / SIGTERM ──► graceful shutdown
//! ```
//!
//! `RUST_LOG` controls verbosity (default `info`).

use std::path::PathBuf;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dapur_db::Database;
use dapur_hub::EventHub;
use dapur_server::{build_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let Some(config_path) = parse_args() else {
        return Ok(());
    };

    info!("Starting Dapur server...");
    let config = ServerConfig::load(config_path)?;
    info!(
        bind = %config.server.bind_address(),
        database = %config.database.path.display(),
        utc_offset_minutes = config.orders.utc_offset_minutes,
        "Configuration loaded"
    );

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = Database::new(config.db_config()).await?;
    if config.database.seed_demo_data {
        dapur_db::seed::seed_demo_data(db.pool()).await?;
    }

    let hub = EventHub::new(config.hub_config());
    let state = AppState::new(db.clone(), hub, config.order_settings());
    let app = build_router(state);

    let listener = TcpListener::bind(config.server.bind_address()).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Returns `None` when the process should exit (after `--help`).
fn parse_args() -> Option<Option<PathBuf>> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" if i + 1 < args.len() => {
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--help" | "-h" => {
                println!("Usage: dapur-server [--config <path>]");
                println!();
                println!("Environment overrides: DAPUR_BIND_ADDR, DAPUR_PORT, DAPUR_DATABASE_PATH,");
                println!("  DAPUR_SUBSCRIBER_BUFFER, DAPUR_UTC_OFFSET_MINUTES, DAPUR_DEFAULT_ORDER_PREFIX,");
                println!("  DAPUR_SEED_DEMO_DATA, DAPUR_CONFIG");
                return None;
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }
    Some(config_path)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
