//! # Tally API
//!
//! HTTP server for the POS back office: document lifecycle (quotes,
//! invoices, orders), storefront checkout and shift reconciliation.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally API Server                               │
//! │                                                                         │
//! │  ┌────────────────┐   ┌─────────────────────┐   ┌────────────────────┐ │
//! │  │  routes        │   │  services           │   │  tally-db          │ │
//! │  │                │   │                     │   │                    │ │
//! │  │ • documents    │──►│ • DocumentLifecycle │──►│ • UnitOfWork       │ │
//! │  │ • storefront   │   │ • ShiftService      │   │ • StockLedger      │ │
//! │  │ • shift        │   │ • Notifier ─────────┼─► │ • DocumentStore    │ │
//! │  │ • health       │   │   (spawned, lossy)  │   │ • ShiftRepository  │ │
//! │  └───────┬────────┘   └─────────────────────┘   └────────────────────┘ │
//! │          │                                                              │
//! │  ┌───────┴────────┐                                                     │
//! │  │  auth          │  Bearer JWT (HS256), role admin|manager|cashier    │
//! │  └────────────────┘                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - listen port (default: 8080)
//! - `BIND_ADDR` - listen interface (default: 0.0.0.0)
//! - `DATABASE_PATH` - SQLite file (default: ./tally.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_ACCESS_LIFETIME_SECS` - Access token lifetime (default: 3600)
//! - `ALLOW_OVERSELL_INVOICE` - till invoices may oversell (default: true)
//! - `ALLOW_OVERSELL_ORDER` - storefront orders may oversell (default: false)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
