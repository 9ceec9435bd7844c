//! # tally-db: Database Layer for Tally POS Back Office
//!
//! SQLite persistence with sqlx: the stock ledger, the document store,
//! customers, outlets and shifts, plus the unit of work that ties a
//! lifecycle operation's writes together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (tally-api)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Lifecycle / shift service (rules from tally-core)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ StockLedger    │    │              │  │   │
//! │  │   │ SqlitePool    │───►│ DocumentStore  │    │ 001_initial_ │  │   │
//! │  │   │ write gate    │    │ Customer/Outlet│    │   schema.sql │  │   │
//! │  │   │ UnitOfWork    │    │ ShiftRepository│    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, write gate, entry points
//! - [`unit_of_work`] - Transaction + gate for lifecycle writes
//! - [`session`] - Pooled connection for reads
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./tally.db")).await?;
//!
//! let mut uow = db.begin().await?;
//! uow.stock().decrement_checked(product_id, 2).await?;
//! uow.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod session;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use session::Session;
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::customer::{CustomerRepository, NewCustomer};
pub use repository::document::{DocumentStore, NewDocument, NewLine, SalesWindow};
pub use repository::outlet::{NewOutlet, OutletRepository};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::shift::ShiftRepository;
pub use repository::stock::StockLedger;
