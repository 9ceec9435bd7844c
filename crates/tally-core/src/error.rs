//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError           - Lifecycle rule violations                   │
//! │  ├── ValidationError     - Input validation failures                   │
//! │  └── ReconciliationError - Shift close rejections                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError             - Database operation failures                 │
//! │                                                                         │
//! │  tally-api errors                                                      │
//! │  └── ApiError            - HTTP status + {"error": "..."} body         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::types::{DocumentStatus, DocumentType};

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the document lifecycle.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product referenced by a line does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Document does not exist.
    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    /// Customer does not exist.
    #[error("Customer not found: {0}")]
    CustomerNotFound(i64),

    /// Not enough stock on a checked path.
    ///
    /// ## When This Occurs
    /// - Converting a quote whose lines exceed current stock
    /// - Creating a document on a path whose policy forbids overselling
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Status is not part of the document type's status set.
    #[error("Invalid status '{status}' for {doc_type}")]
    InvalidStatus {
        doc_type: DocumentType,
        status: DocumentStatus,
    },

    /// Status exists for the type but the move goes backwards or leaves a terminal state.
    #[error("Cannot change {doc_type} status from '{from}' to '{to}'")]
    InvalidTransition {
        doc_type: DocumentType,
        from: DocumentStatus,
        to: DocumentStatus,
    },

    /// Conversion attempted on something that is not a live quote.
    #[error("{0}")]
    NotConvertible(String),

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Shift close rejected (wraps ReconciliationError).
    #[error("{0}")]
    Reconciliation(#[from] ReconciliationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Reconciliation Error
// =============================================================================

/// Reasons a shift close is refused.
///
/// Messages are shown verbatim by the POS close-shift dialog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconciliationError {
    /// Cash is expected in the drawer but nothing was counted.
    #[error("Please enter cash counts before closing the shift (expected {expected})")]
    MissingCashCounts { expected: Money },

    /// Counts were entered but add up to nothing.
    #[error("Counted cash must be greater than zero when {expected} is expected")]
    NoCashCounted { expected: Money },

    /// Material discrepancy without an explanation.
    #[error("A note is required to close with a discrepancy of {discrepancy}")]
    NoteRequired { discrepancy: Money },

    /// Material discrepancy that the cashier has not acknowledged.
    #[error("Discrepancy of {discrepancy} must be confirmed before closing the shift")]
    ConfirmationRequired { discrepancy: Money },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
