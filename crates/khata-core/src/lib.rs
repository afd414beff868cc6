//! # khata-core: Pure Business Logic for Dukaan Khata
//!
//! This crate is the **heart** of Dukaan Khata, a bookkeeping system for a
//! retail cloth shop. It contains all business logic as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Dukaan Khata Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Presentation (external)                        │   │
//! │  │    Dashboard ──► Dealers ──► Customers ──► Inventory ──► Admin │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ khata-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │   stock   │  │   │
//! │  │   │  Dealer   │  │   Money   │  │ balances  │  │ availab.  │  │   │
//! │  │   │ Bill Sale │  │  (paisa)  │  │ summaries │  │ grouping  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  khata-db (Record Store)                        │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Dealer, Bill, Customer, Sale, User, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - Balance, aggregate and summary derivations
//! - [`stock`] - Inventory availability and grouping rules
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every derivation recomputes from the snapshot it
//!    is handed - same input = same output, nothing is cached.
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here.
//! 3. **Integer Money**: All monetary values are in paisa (i64) to avoid
//!    float drift.
//! 4. **Explicit Errors**: All errors are typed, never strings or panics.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use ledger::LedgerSnapshot;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single stock item on one sale line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum line items allowed on a single bill or sale.
pub const MAX_LINE_ITEMS: usize = 100;
