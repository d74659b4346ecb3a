//! # Repository Module
//!
//! One repository per table family, each a thin handle over the pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │  state.db.checkout().commit_sale(lines, method, cashier)        │
//! │       ▼                                                                 │
//! │  CheckoutRepository ──► BEGIN … sales, sale_items, products … COMMIT   │
//! │                                                                         │
//! │  Reads (products, sales, reports) go straight to the pool.             │
//! │  Writes spanning tables share connection-level helpers and run inside  │
//! │  one transaction.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog, search, stock adjustments
//! - [`SaleRepository`](sale::SaleRepository) - Sales history reads
//! - [`CheckoutRepository`](checkout::CheckoutRepository) - Commit, resumed commit, edit, delete
//! - [`ProfileRepository`](profile::ProfileRepository) - Staff accounts
//! - [`ExpenseRepository`](expense::ExpenseRepository) - Till expenses
//! - [`ReportRepository`](report::ReportRepository) - Summary and best sellers
//! - [`SettingsRepository`](settings::SettingsRepository) - Store settings
//! - [`BackupRepository`](backup::BackupRepository) - Snapshot and restore

pub mod backup;
pub mod checkout;
pub mod expense;
pub mod product;
pub mod profile;
pub mod report;
pub mod sale;
pub mod settings;
