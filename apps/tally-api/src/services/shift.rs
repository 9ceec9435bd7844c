//! Shift reconciliation service.
//!
//! ## Expected Cash
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  window = [shift.started_at, now], documents created by the shift user  │
//! │                                                                         │
//! │  expected = starting cash + cash sales + pay-ins - pay-outs             │
//! │  actual   = Σ notes × value + coins                                     │
//! │  discrepancy = actual - expected                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One shift per staff member may be open at a time. Starting a new one
//! while the old is open requires the caller to say how the old one closes.

use serde::Serialize;
use tracing::{debug, info, warn};

use tally_core::reconciliation::{
    force_close, reconcile, CashMovement, CashMovementKind, CloseSubmission, Reconciliation,
    Shift, ShiftSummary,
};
use tally_core::validation::{validate_non_negative, validate_notes, validate_positive};
use tally_core::Money;
use tally_db::{Database, SalesWindow};

use crate::error::{ApiError, ApiResult};

/// How to close a shift that is still open when a new one starts.
#[derive(Debug, Clone)]
pub enum ClosePrevious {
    /// Close without the reconciliation rules; the counts (if any) are
    /// recorded as given once they pass input validation.
    Forced(CloseSubmission),
    /// Run the full close validation.
    Validated(CloseSubmission),
}

impl ClosePrevious {
    pub fn submission(&self) -> &CloseSubmission {
        match self {
            ClosePrevious::Forced(submission) | ClosePrevious::Validated(submission) => submission,
        }
    }
}

/// Input checks shared by every close path, run before any arithmetic.
fn validate_submission(submission: &CloseSubmission) -> ApiResult<()> {
    submission.cash_counts.validate()?;
    validate_notes(submission.notes.as_deref())?;
    Ok(())
}

/// An open shift with its running totals.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftReport {
    pub shift: Shift,
    pub summary: ShiftSummary,
}

/// Result of starting a shift.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftStart {
    pub shift: Shift,
    /// The shift closed on the way, if one was open.
    pub closed_previous: Option<Shift>,
}

#[derive(Clone)]
pub struct ShiftService {
    db: Database,
}

impl ShiftService {
    pub fn new(db: Database) -> Self {
        ShiftService { db }
    }

    /// The caller's open shift and its running totals.
    pub async fn current(&self, user_id: &str) -> ApiResult<Option<ShiftReport>> {
        let mut session = self.db.session().await?;

        let Some(shift) = session.shifts().current(user_id).await? else {
            return Ok(None);
        };

        let window = session.documents().sales_window(user_id, shift.started_at).await?;
        let movements = session.shifts().movement_totals(shift.id).await?;
        let summary = summarize(&shift, window, movements);

        Ok(Some(ShiftReport { shift, summary }))
    }

    /// Opens a shift, closing a still-open one as `close_previous` says.
    ///
    /// ## Errors
    /// - `Conflict` - a shift is open and `close_previous` is `None`
    /// - `BadRequest` - the close counts or notes are invalid, or the
    ///   validated close of the previous shift failed
    pub async fn start(
        &self,
        user_id: &str,
        starting_cash: Money,
        close_previous: Option<ClosePrevious>,
    ) -> ApiResult<ShiftStart> {
        validate_non_negative("startingCash", starting_cash)?;
        if let Some(how) = &close_previous {
            validate_submission(how.submission())?;
        }

        let mut uow = self.db.begin().await?;

        let closed_previous = match uow.shifts().current(user_id).await? {
            None => {
                if close_previous.is_some() {
                    debug!(user_id, "No open shift, ignoring close instruction");
                }
                None
            }
            Some(open) => {
                let Some(how) = close_previous else {
                    return Err(ApiError::Conflict(
                        "A shift is already open; close it or choose how to close it first"
                            .to_string(),
                    ));
                };

                let window = uow.documents().sales_window(user_id, open.started_at).await?;
                let movements = uow.shifts().movement_totals(open.id).await?;
                let expected = summarize(&open, window, movements).expected_cash();

                let closing = match &how {
                    ClosePrevious::Forced(submission) => {
                        let closing = force_close(expected, submission);
                        warn!(
                            shift_id = open.id,
                            user_id,
                            expected = %closing.expected_cash,
                            discrepancy = %closing.discrepancy,
                            "Previous shift force-closed"
                        );
                        closing
                    }
                    ClosePrevious::Validated(submission) => {
                        let closing = reconcile(expected, submission)?;
                        log_override(open.id, user_id, &closing);
                        closing
                    }
                };

                Some(uow.shifts().close(open.id, &closing).await?)
            }
        };

        let shift = uow.shifts().open(user_id, starting_cash).await?;
        uow.commit().await?;

        info!(
            shift_id = shift.id,
            user_id,
            starting_cash = %starting_cash,
            closed_previous = closed_previous.as_ref().map(|s| s.id),
            "Shift started"
        );

        Ok(ShiftStart {
            shift,
            closed_previous,
        })
    }

    /// Closes the caller's open shift after reconciliation.
    ///
    /// `client_actual` and `client_discrepancy` are what the till computed;
    /// the server figures win and mismatches are only logged.
    pub async fn close(
        &self,
        user_id: &str,
        submission: CloseSubmission,
        client_actual: Option<Money>,
        client_discrepancy: Option<Money>,
    ) -> ApiResult<Shift> {
        validate_submission(&submission)?;

        let mut uow = self.db.begin().await?;

        let open = uow
            .shifts()
            .current(user_id)
            .await?
            .ok_or_else(|| ApiError::Conflict("No open shift to close".to_string()))?;

        let window = uow.documents().sales_window(user_id, open.started_at).await?;
        let movements = uow.shifts().movement_totals(open.id).await?;
        let expected = summarize(&open, window, movements).expected_cash();

        let closing = reconcile(expected, &submission)?;

        if client_actual.is_some_and(|actual| actual != closing.actual_cash)
            || client_discrepancy.is_some_and(|d| d != closing.discrepancy)
        {
            warn!(
                shift_id = open.id,
                client_actual = ?client_actual,
                client_discrepancy = ?client_discrepancy,
                actual = %closing.actual_cash,
                discrepancy = %closing.discrepancy,
                "Client cash figures differ from server reconciliation"
            );
        }

        log_override(open.id, user_id, &closing);

        let closed = uow.shifts().close(open.id, &closing).await?;
        uow.commit().await?;

        info!(
            shift_id = closed.id,
            user_id,
            expected = %closing.expected_cash,
            actual = %closing.actual_cash,
            discrepancy = %closing.discrepancy,
            "Shift closed"
        );

        Ok(closed)
    }

    /// Records a pay-in or pay-out against the caller's open shift.
    pub async fn add_movement(
        &self,
        user_id: &str,
        kind: CashMovementKind,
        amount: Money,
        reason: Option<String>,
    ) -> ApiResult<CashMovement> {
        validate_positive("amount", amount)?;
        validate_notes(reason.as_deref())?;

        let mut uow = self.db.begin().await?;

        let open = uow
            .shifts()
            .current(user_id)
            .await?
            .ok_or_else(|| ApiError::Conflict("No open shift for cash movements".to_string()))?;

        let reason = reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
        let movement = uow.shifts().add_movement(open.id, kind, amount, reason).await?;
        uow.commit().await?;

        info!(shift_id = open.id, kind = ?kind, amount = %amount, "Cash movement recorded");

        Ok(movement)
    }
}

fn summarize(
    shift: &Shift,
    window: SalesWindow,
    (pay_ins, pay_outs): (Money, Money),
) -> ShiftSummary {
    ShiftSummary {
        starting_cash: shift.starting_cash,
        total_sales: Money::from_cents(window.total_cents),
        cash_sales: Money::from_cents(window.cash_cents),
        card_sales: Money::from_cents(window.card_cents),
        transaction_count: window.transaction_count,
        pay_ins,
        pay_outs,
    }
}

fn log_override(shift_id: i64, user_id: &str, closing: &Reconciliation) {
    if closing.override_confirmed {
        warn!(
            shift_id,
            user_id,
            discrepancy = %closing.discrepancy,
            notes = closing.notes.as_deref().unwrap_or_default(),
            "Shift closed with confirmed discrepancy"
        );
    }
}
