//! # Mini Market Server
//!
//! ## Usage
//! ```bash
//! # Platform config file, or defaults
//! minimarket-server
//!
//! # Explicit config file
//! minimarket-server ./server.toml
//! MINIMARKET_CONFIG=./server.toml minimarket-server
//! ```

use std::path::PathBuf;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use minimarket_db::{Database, DbConfig};
use minimarket_server::{build_router, init_tracing, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MINIMARKET_CONFIG").ok())
        .map(PathBuf::from);

    let config = ServerConfig::load(config_path).context("loading server configuration")?;
    init_tracing(&config.logging.filter);

    info!("Starting Mini Market server...");

    let db_path = config.database_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory {}", parent.display()))?;
    }

    let db = Database::new(DbConfig::new(&db_path).max_connections(config.database.max_connections))
        .await
        .context("opening database")?;
    info!(path = %db_path.display(), "Database ready");

    let state = AppState::new(db.clone()).await.context("loading store settings")?;
    let app = build_router(state);

    let addr = config.http.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(?e, "Failed to listen for Ctrl+C");
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
                warn!(?e, "Failed to install SIGTERM handler");
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
