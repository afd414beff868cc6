//! # Repository Module
//!
//! Database repository implementations for Dukaan Khata.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │                                                                 │
//! │       │  db.dealers().add_payment(bill_id, amount, date, payer)        │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  DealerRepository                                                      │
//! │  ├── create(&self, name, contact)                                      │
//! │  ├── add_bill(&self, ...)                                              │
//! │  ├── add_payment(&self, ...)                                           │
//! │  └── delete(&self, id)                                                 │
//! │       │                                                                 │
//! │       │  SQL Query (in a transaction where more than one row moves)    │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Multi-step mutations commit atomically or not at all                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`dealer::DealerRepository`] - Dealers, bills, payments and stock intake
//! - [`customer::CustomerRepository`] - Customer lookup and search
//! - [`sale::SaleRepository`] - Sale recording, editing and deletion
//! - [`user::UserRepository`] - Staff accounts and permissions
//! - [`session::SessionRepository`] - Sign-in, sign-out, authorization

pub mod customer;
pub mod dealer;
pub mod sale;
pub mod session;
pub mod user;
