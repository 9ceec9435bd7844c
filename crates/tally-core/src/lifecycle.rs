//! # Document Lifecycle Rules
//!
//! The pure half of the document lifecycle: which statuses a type may hold,
//! which moves between them are legal, how totals are computed, and which
//! stock effect each creation path has. The database half (unit of work,
//! stock ledger) lives in `tally-db`; orchestration lives in `tally-api`.
//!
//! ## State Machines
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  QUOTE                                                                  │
//! │    draft ──► sent ──► accepted                                          │
//! │      │         │                                                        │
//! │      └────┬────┘                                                        │
//! │           ▼                                                             │
//! │       cancelled                                                         │
//! │                                                                         │
//! │  INVOICE / ORDER                                                        │
//! │    issued ──► paid                                                      │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │    cancelled                                                            │
//! │                                                                         │
//! │  CONVERSION (cross-type, one way)                                       │
//! │    quote{draft|sent|accepted} ══► invoice{issued}   stock checked       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Moves only go forward. `accepted`, `paid` and `cancelled` are terminal.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Document, DocumentStatus, DocumentType, TaxRate};

// =============================================================================
// Status Sets
// =============================================================================

const QUOTE_STATUSES: &[DocumentStatus] = &[
    DocumentStatus::Draft,
    DocumentStatus::Sent,
    DocumentStatus::Accepted,
    DocumentStatus::Cancelled,
];

const INVOICE_STATUSES: &[DocumentStatus] = &[
    DocumentStatus::Issued,
    DocumentStatus::Paid,
    DocumentStatus::Cancelled,
];

/// Statuses a document of this type may hold.
///
/// Orders have no state machine of their own and share the invoice set.
pub fn allowed_statuses(doc_type: DocumentType) -> &'static [DocumentStatus] {
    match doc_type {
        DocumentType::Quote => QUOTE_STATUSES,
        DocumentType::Invoice | DocumentType::Order => INVOICE_STATUSES,
    }
}

/// Status a freshly created document starts in.
pub fn initial_status(doc_type: DocumentType) -> DocumentStatus {
    match doc_type {
        DocumentType::Quote => DocumentStatus::Draft,
        DocumentType::Invoice | DocumentType::Order => DocumentStatus::Issued,
    }
}

/// Whether documents of this type have taken stock out of the ledger.
///
/// Decides whether deletion must hand stock back.
pub fn holds_stock(doc_type: DocumentType) -> bool {
    !matches!(doc_type, DocumentType::Quote)
}

fn is_terminal(status: DocumentStatus) -> bool {
    matches!(
        status,
        DocumentStatus::Accepted | DocumentStatus::Paid | DocumentStatus::Cancelled
    )
}

/// Forward edges other than cancellation.
///
/// ```text
/// quote:    draft ──► sent ──► accepted
/// invoice:  issued ──► paid
/// ```
fn is_forward_step(from: DocumentStatus, to: DocumentStatus) -> bool {
    use DocumentStatus as S;
    matches!(
        (from, to),
        (S::Draft, S::Sent) | (S::Sent, S::Accepted) | (S::Issued, S::Paid)
    )
}

/// Checks a status change against the type's status set and forward-only rule.
///
/// Setting the current status again is accepted as a no-op.
///
/// ```rust
/// use tally_core::lifecycle::validate_status_change;
/// use tally_core::{DocumentStatus as S, DocumentType as T};
///
/// assert!(validate_status_change(T::Invoice, S::Issued, S::Paid).is_ok());
/// assert!(validate_status_change(T::Invoice, S::Issued, S::Draft).is_err());
/// assert!(validate_status_change(T::Invoice, S::Paid, S::Issued).is_err());
/// ```
pub fn validate_status_change(
    doc_type: DocumentType,
    from: DocumentStatus,
    to: DocumentStatus,
) -> CoreResult<()> {
    if !allowed_statuses(doc_type).contains(&to) {
        return Err(CoreError::InvalidStatus {
            doc_type,
            status: to,
        });
    }

    if from == to {
        return Ok(());
    }

    let invalid = || CoreError::InvalidTransition { doc_type, from, to };

    if is_terminal(from) {
        return Err(invalid());
    }

    if to == DocumentStatus::Cancelled {
        return Ok(());
    }

    if is_forward_step(from, to) {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Checks that a document may be converted into an invoice.
pub fn ensure_convertible(doc: &Document) -> CoreResult<()> {
    if doc.doc_type != DocumentType::Quote {
        return Err(CoreError::NotConvertible(
            "Only quotes can be converted".to_string(),
        ));
    }

    if doc.status == DocumentStatus::Cancelled {
        return Err(CoreError::NotConvertible(
            "Cancelled quotes cannot be converted".to_string(),
        ));
    }

    Ok(())
}

// =============================================================================
// Totals
// =============================================================================

/// A line as submitted, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDraft {
    /// Catalog product, or `None` for a free-text line.
    pub product_id: Option<i64>,
    /// Name for free-text lines; catalog lines snapshot the product name.
    pub name: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
}

impl LineDraft {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Computed money figures of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

/// `subtotal = Σ price × qty`, `tax = subtotal × rate`, `total = subtotal + tax`.
///
/// Tax is applied once on the subtotal, not per line.
pub fn compute_totals(lines: &[LineDraft], rate: TaxRate) -> DocumentTotals {
    let subtotal: Money = lines.iter().map(LineDraft::line_total).sum();
    let tax = subtotal.calculate_tax(rate);
    DocumentTotals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

// =============================================================================
// Stock Policy
// =============================================================================

/// Where a document creation request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationPath {
    /// Cashier at the till (`POST /api/invoices`).
    PointOfSale,
    /// Public storefront checkout (`POST /api/orders`).
    Storefront,
}

/// How a lifecycle step treats the stock ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockCheck {
    /// Stock is not touched (quotes).
    Untouched,
    /// Conditional decrement; insufficient stock aborts the unit of work.
    Checked,
    /// Decrement regardless of stock; may go negative.
    Oversell,
}

/// Oversell switches per creation path.
///
/// Conversion is not configurable: it is always [`StockCheck::Checked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPolicy {
    /// Till invoices may oversell (cashier overrides the warehouse).
    pub allow_oversell_invoice: bool,
    /// Storefront orders may oversell.
    pub allow_oversell_order: bool,
}

impl Default for StockPolicy {
    fn default() -> Self {
        StockPolicy {
            allow_oversell_invoice: true,
            allow_oversell_order: false,
        }
    }
}

impl StockPolicy {
    /// Stock effect of creating a document of `doc_type`.
    pub fn on_create(&self, doc_type: DocumentType) -> StockCheck {
        let allow = match doc_type {
            DocumentType::Quote => return StockCheck::Untouched,
            DocumentType::Invoice => self.allow_oversell_invoice,
            DocumentType::Order => self.allow_oversell_order,
        };

        if allow {
            StockCheck::Oversell
        } else {
            StockCheck::Checked
        }
    }

    /// Stock effect of converting a quote.
    pub const fn on_convert(&self) -> StockCheck {
        StockCheck::Checked
    }
}

/// Document types each creation path may produce.
pub fn creatable_types(path: CreationPath) -> &'static [DocumentType] {
    match path {
        CreationPath::PointOfSale => &[DocumentType::Invoice, DocumentType::Quote],
        CreationPath::Storefront => &[DocumentType::Order, DocumentType::Quote],
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
