//! # State Module
//!
//! Everything a handler can reach, bundled into one cloneable [`AppState`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  Router::with_state(AppState)                                          │
//! │                              │                                          │
//! │      ┌──────────────┬────────┴───────┬──────────────────┐              │
//! │      ▼              ▼                ▼                  ▼               │
//! │  ┌──────────┐  ┌──────────────┐  ┌────────────┐  ┌───────────────┐     │
//! │  │ Database │  │ SessionState │  │ ResumeSlot │  │ SettingsState │     │
//! │  │ (pool)   │  │ cart,        │  │ one stashed│  │ StoreSettings │     │
//! │  │          │  │ resumed sale,│  │ payload    │  │ cached        │     │
//! │  │          │  │ last sale    │  │            │  │               │     │
//! │  └──────────┘  └──────────────┘  └────────────┘  └───────────────┘     │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: pool is internally synchronised                           │
//! │  • SessionState / ResumeSlot: Arc<std::sync::Mutex<_>>, never held     │
//! │    across an .await                                                    │
//! │  • SettingsState: Arc<tokio::sync::RwLock<_>>                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod session;
mod settings;

pub use session::{CheckoutSession, ResumeSlot, SessionState};
pub use settings::SettingsState;

use minimarket_db::{Database, DbResult};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub session: SessionState,
    pub resume: ResumeSlot,
    pub settings: SettingsState,
}

impl AppState {
    /// Builds the state for a freshly opened database, loading store
    /// settings once.
    pub async fn new(db: Database) -> DbResult<Self> {
        let settings = SettingsState::load(&db).await?;

        Ok(AppState {
            db,
            session: SessionState::new(),
            resume: ResumeSlot::new(),
            settings,
        })
    }
}
