//! # tally-core: Pure Business Logic for the Tally Back Office
//!
//! This crate holds the rules of the document lifecycle and the shift cash
//! reconciliation as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          POS (React)              Storefront (React)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-api (axum)                             │   │
//! │  │    invoices, orders, shift operations                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌────────────┐  │   │
//! │  │   │   types   │  │   money   │  │ lifecycle │  │reconcilia- │  │   │
//! │  │   │ Document  │  │   Money   │  │  status   │  │   tion     │  │   │
//! │  │   │  Product  │  │  TaxRate  │  │  rules    │  │ CashCounts │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (SQLite)                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Document, DocumentLine, Customer, Outlet)
//! - [`money`] - Money type with integer arithmetic
//! - [`lifecycle`] - Document status machine, totals and stock policy
//! - [`reconciliation`] - Shift close validation and cash counting
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::reconciliation::CashCounts;
//!
//! let counts = CashCounts {
//!     hundreds: 2,
//!     fifties: 1,
//!     coins: Money::from_cents(450),
//!     ..CashCounts::default()
//! };
//! assert_eq!(counts.actual_cash(), Money::from_cents(25450));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod reconciliation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ReconciliationError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed on a single document.
pub const MAX_DOCUMENT_LINES: usize = 200;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches keying mistakes (10000 instead of 10) at the till.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest single amount accepted as input, in cents (100,000,000.00).
///
/// Applies to unit prices, starting cash, drawer movements and coins.
/// With `MAX_ITEM_QUANTITY` and `MAX_DOCUMENT_LINES` this keeps every
/// document total well inside `i64` cents.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000;

/// Most notes of one denomination a drawer count may report.
pub const MAX_NOTE_COUNT: i64 = 100_000;
