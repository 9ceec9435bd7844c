//! # Shift Reconciliation
//!
//! Turns a cashier's drawer count into a closing record and decides whether
//! the shift may close.
//!
//! ## Close Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ShiftSummary ──► expected_cash = starting + cash sales                 │
//! │                                  + pay-ins - pay-outs                   │
//! │                                                                         │
//! │  CashCounts   ──► actual_cash   = Σ count × face value + coins          │
//! │                                                                         │
//! │  reconcile()                                                            │
//! │    1. expected > 0.01, nothing counted      → MissingCashCounts         │
//! │    2. expected > 0.01, actual <= 0          → NoCashCounted             │
//! │    3. |actual - expected| > 1.00, no note   → NoteRequired              │
//! │    4. |actual - expected| > 1.00, no confirm→ ConfirmationRequired      │
//! │    5. OK → Reconciliation { kind: Validated }                           │
//! │                                                                         │
//! │  force_close() skips every check → Reconciliation { kind: Forced }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ReconciliationError, ValidationError};
use crate::money::Money;
use crate::validation::validate_non_negative;
use crate::MAX_NOTE_COUNT;

// =============================================================================
// Denominations
// =============================================================================

/// Note values counted individually. Smaller change goes into `coins`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denomination {
    Hundred,
    Fifty,
    Twenty,
    Ten,
    Five,
    One,
}

impl Denomination {
    pub const ALL: [Denomination; 6] = [
        Denomination::Hundred,
        Denomination::Fifty,
        Denomination::Twenty,
        Denomination::Ten,
        Denomination::Five,
        Denomination::One,
    ];

    /// Face value of one note.
    pub const fn value(&self) -> Money {
        match self {
            Denomination::Hundred => Money::from_cents(100_00),
            Denomination::Fifty => Money::from_cents(50_00),
            Denomination::Twenty => Money::from_cents(20_00),
            Denomination::Ten => Money::from_cents(10_00),
            Denomination::Five => Money::from_cents(5_00),
            Denomination::One => Money::from_cents(1_00),
        }
    }

    /// Key used by the close-shift form.
    pub const fn key(&self) -> &'static str {
        match self {
            Denomination::Hundred => "hundreds",
            Denomination::Fifty => "fifties",
            Denomination::Twenty => "twenties",
            Denomination::Ten => "tens",
            Denomination::Five => "fives",
            Denomination::One => "ones",
        }
    }
}

// =============================================================================
// Cash Counts
// =============================================================================

/// A drawer count: number of notes per denomination plus loose coins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CashCounts {
    pub hundreds: i64,
    pub fifties: i64,
    pub twenties: i64,
    pub tens: i64,
    pub fives: i64,
    pub ones: i64,
    /// Coins counted as an amount rather than per coin.
    pub coins: Money,
}

impl CashCounts {
    /// Number of notes counted for `denomination`.
    pub fn count(&self, denomination: Denomination) -> i64 {
        match denomination {
            Denomination::Hundred => self.hundreds,
            Denomination::Fifty => self.fifties,
            Denomination::Twenty => self.twenties,
            Denomination::Ten => self.tens,
            Denomination::Five => self.fives,
            Denomination::One => self.ones,
        }
    }

    /// `Σ count × value + coins`.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::reconciliation::CashCounts;
    ///
    /// let counts = CashCounts { tens: 3, coins: Money::from_cents(120), ..Default::default() };
    /// assert_eq!(counts.actual_cash().cents(), 3120);
    /// ```
    pub fn actual_cash(&self) -> Money {
        let notes: Money = Denomination::ALL
            .iter()
            .map(|d| d.value() * self.count(*d))
            .sum();
        notes + self.coins
    }

    /// True when at least one denomination or the coin amount is non-zero.
    pub fn has_any_count(&self) -> bool {
        Denomination::ALL.iter().any(|d| self.count(*d) != 0) || !self.coins.is_zero()
    }

    /// Each count must be in `0..=MAX_NOTE_COUNT` and coins in
    /// `0..=MAX_AMOUNT_CENTS`, which keeps `actual_cash` from overflowing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for denomination in Denomination::ALL {
            let count = self.count(denomination);
            let field = format!("cashCounts.{}", denomination.key());
            if count < 0 {
                return Err(ValidationError::Negative { field });
            }
            if count > MAX_NOTE_COUNT {
                return Err(ValidationError::OutOfRange {
                    field,
                    min: 0,
                    max: MAX_NOTE_COUNT,
                });
            }
        }

        validate_non_negative("cashCounts.coins", self.coins)
    }
}

// =============================================================================
// Shift Summary
// =============================================================================

/// Sales and drawer movements of an open shift's window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShiftSummary {
    pub starting_cash: Money,
    pub total_sales: Money,
    pub cash_sales: Money,
    pub card_sales: Money,
    pub transaction_count: i64,
    pub pay_ins: Money,
    pub pay_outs: Money,
}

impl ShiftSummary {
    /// Cash that should be in the drawer right now.
    pub fn expected_cash(&self) -> Money {
        self.starting_cash + self.cash_sales + self.pay_ins - self.pay_outs
    }
}

// =============================================================================
// Closing
// =============================================================================

/// How a shift was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CloseKind {
    /// Every reconciliation check passed.
    Validated,
    /// Closed without checks (e.g. abandoned drawer found at next shift start).
    Forced,
}

/// What the cashier submits when closing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseSubmission {
    pub cash_counts: CashCounts,
    pub notes: Option<String>,
    /// The cashier acknowledged a discrepancy above tolerance.
    pub confirm_discrepancy: bool,
}

impl CloseSubmission {
    /// Notes with surrounding whitespace removed; blank notes count as none.
    pub fn trimmed_notes(&self) -> Option<String> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

/// The immutable result of closing a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Reconciliation {
    pub kind: CloseKind,
    pub expected_cash: Money,
    pub actual_cash: Money,
    /// `actual - expected`; negative means the drawer is short.
    pub discrepancy: Money,
    pub cash_counts: CashCounts,
    pub notes: Option<String>,
    /// A material discrepancy was closed on the cashier's confirmation.
    pub override_confirmed: bool,
}

/// Expected cash above one cent means the drawer must have been counted.
const EXPECTED_CASH_FLOOR: Money = Money::ONE_CENT;

/// Discrepancies above one currency unit need a note and a confirmation.
const DISCREPANCY_TOLERANCE: Money = Money::ONE_UNIT;

/// Whether a discrepancy exceeds the tolerance.
pub fn is_material(discrepancy: Money) -> bool {
    discrepancy.abs() > DISCREPANCY_TOLERANCE
}

/// Runs the close validation and builds the closing record.
pub fn reconcile(
    expected_cash: Money,
    submission: &CloseSubmission,
) -> Result<Reconciliation, ReconciliationError> {
    let counts = &submission.cash_counts;
    let actual_cash = counts.actual_cash();
    let discrepancy = actual_cash - expected_cash;
    let notes = submission.trimmed_notes();

    if expected_cash > EXPECTED_CASH_FLOOR {
        if !counts.has_any_count() {
            return Err(ReconciliationError::MissingCashCounts {
                expected: expected_cash,
            });
        }
        if !actual_cash.is_positive() {
            return Err(ReconciliationError::NoCashCounted {
                expected: expected_cash,
            });
        }
    }

    let material = is_material(discrepancy);

    if material && notes.is_none() {
        return Err(ReconciliationError::NoteRequired { discrepancy });
    }

    if material && !submission.confirm_discrepancy {
        return Err(ReconciliationError::ConfirmationRequired { discrepancy });
    }

    Ok(Reconciliation {
        kind: CloseKind::Validated,
        expected_cash,
        actual_cash,
        discrepancy,
        cash_counts: counts.clone(),
        notes,
        override_confirmed: material,
    })
}

/// Builds a closing record without any checks.
pub fn force_close(expected_cash: Money, submission: &CloseSubmission) -> Reconciliation {
    let actual_cash = submission.cash_counts.actual_cash();
    Reconciliation {
        kind: CloseKind::Forced,
        expected_cash,
        actual_cash,
        discrepancy: actual_cash - expected_cash,
        cash_counts: submission.cash_counts.clone(),
        notes: submission.trimmed_notes(),
        override_confirmed: false,
    }
}

// =============================================================================
// Shifts & Drawer Movements
// =============================================================================

/// A cash-drawer session of one staff member.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Shift {
    pub id: i64,
    /// Token subject of the staff member who opened the drawer.
    pub user_id: String,
    #[ts(as = "String")]
    pub started_at: DateTime<Utc>,
    pub starting_cash: Money,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Present once the shift is closed; never changes afterwards.
    pub closing: Option<Reconciliation>,
}

impl Shift {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// Direction of a manual drawer movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CashMovementKind {
    /// Float top-up or change brought into the drawer.
    PayIn,
    /// Petty cash taken out of the drawer.
    PayOut,
}

/// A pay-in or pay-out recorded against an open shift.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashMovement {
    pub id: i64,
    pub shift_id: i64,
    pub kind: CashMovementKind,
    pub amount_cents: i64,
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
