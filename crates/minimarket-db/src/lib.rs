//! # minimarket-db: Database Layer for Mini Market
//!
//! SQLite storage through sqlx: the pool, embedded migrations and one
//! repository per table family. Every write that spans tables (checkout,
//! resumed checkout, sale edit, sale delete, restore) runs in a single
//! transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Mini Market Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/checkout)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  minimarket-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ Product, Sale  │   │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ Checkout, ...  │   │ 001, 002     │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)  or  :memory: in tests                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use minimarket_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("minimarket.db")).await?;
//! let products = db.products().search("rice", 20).await?;
//! let sale = db
//!     .checkout()
//!     .commit_sale(cart.lines(), PaymentMethod::Cash, Some(&cashier_id))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::backup::{BackupRepository, RestoreSummary, Snapshot, SNAPSHOT_VERSION};
pub use repository::checkout::CheckoutRepository;
pub use repository::expense::{DateRange, ExpenseRepository, NewExpense};
pub use repository::product::{NewProduct, ProductRepository, ProductUpdate};
pub use repository::profile::{NewProfile, ProfileRepository, ProfileUpdate};
pub use repository::report::{ReportRepository, SummaryReport, TopProduct, DEFAULT_TOP_PRODUCTS};
pub use repository::sale::{SaleFilter, SaleRepository, DEFAULT_SALES_LIMIT};
pub use repository::settings::SettingsRepository;
