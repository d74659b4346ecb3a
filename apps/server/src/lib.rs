//! # Mini Market Server
//!
//! JSON API over the Mini Market database, serving the checkout terminal
//! and the back office.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP ──► TraceLayer ──► /api router ──► handler (routes/*.rs)         │
//! │                                              │                          │
//! │                   ┌──────────────────────────┼───────────────────┐     │
//! │                   ▼                          ▼                   ▼     │
//! │           SessionState (cart)        Database repositories   Settings  │
//! │           minimarket-core            minimarket-db           cache     │
//! │                                                                         │
//! │  Errors: CoreError / DbError ──► ApiError ──► status + JSON body       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
