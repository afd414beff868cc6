//! # khata-db: Record Store for Dukaan Khata
//!
//! This crate provides database access for the Dukaan Khata bookkeeping
//! system. It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Dukaan Khata Data Flow                             │
//! │                                                                         │
//! │  Caller (form submit, dashboard refresh)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     khata-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (dealer.rs,  │    │  (embedded)  │  │   │
//! │  │   │               │    │   sale.rs...) │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ DealerRepo    │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ SaleRepo      │    │              │  │   │
//! │  │   │ Management    │    │ UserRepo ...  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (khata.db)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (dealer, sale, etc.)
//! - [`snapshot`] - Ledger snapshot assembly and dashboard summaries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use khata_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/khata.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let dealers = db.dealers().list().await?;
//! let snapshot = db.snapshot().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod snapshot;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};
pub use snapshot::DashboardSummary;

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::dealer::DealerRepository;
pub use repository::sale::SaleRepository;
pub use repository::session::SessionRepository;
pub use repository::user::UserRepository;
