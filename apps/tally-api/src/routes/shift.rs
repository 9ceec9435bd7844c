//! Shift endpoints. Every call acts on the caller's own shift.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_core::reconciliation::{
    CashCounts, CashMovement, CashMovementKind, CloseKind, CloseSubmission, Reconciliation, Shift,
    ShiftSummary,
};

use crate::auth::{AuthUser, STAFF};
use crate::error::ApiResult;
use crate::routes::{opt_money, to_money, JsonBody};
use crate::services::{ClosePrevious, ShiftReport, ShiftStart};
use crate::state::AppState;

// =============================================================================
// Cash Counts
// =============================================================================

/// Drawer count with coins as a decimal amount.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CashCountsBody {
    pub hundreds: i64,
    pub fifties: i64,
    pub twenties: i64,
    pub tens: i64,
    pub fives: i64,
    pub ones: i64,
    pub coins: Decimal,
}

impl CashCountsBody {
    fn into_counts(self) -> ApiResult<CashCounts> {
        Ok(CashCounts {
            hundreds: self.hundreds,
            fifties: self.fifties,
            twenties: self.twenties,
            tens: self.tens,
            fives: self.fives,
            ones: self.ones,
            coins: to_money("coins", self.coins)?,
        })
    }
}

impl From<&CashCounts> for CashCountsBody {
    fn from(c: &CashCounts) -> Self {
        CashCountsBody {
            hundreds: c.hundreds,
            fifties: c.fifties,
            twenties: c.twenties,
            tens: c.tens,
            fives: c.fives,
            ones: c.ones,
            coins: c.coins.to_decimal(),
        }
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseMode {
    Forced,
    Validated,
}

/// How to close a shift left open, sent with a new shift start.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePreviousRequest {
    pub mode: CloseMode,
    #[serde(default)]
    pub cash_counts: CashCountsBody,
    pub notes: Option<String>,
    #[serde(default)]
    pub confirm_discrepancy: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartShiftRequest {
    pub starting_cash: Decimal,
    pub close_previous: Option<ClosePreviousRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftRequest {
    /// What the till computed; informational only.
    pub actual_cash: Option<Decimal>,
    #[serde(default)]
    pub cash_counts: CashCountsBody,
    /// What the till computed; informational only.
    pub discrepancy: Option<Decimal>,
    pub notes: Option<String>,
    #[serde(default)]
    pub confirm_discrepancy: bool,
}

#[derive(Debug, Deserialize)]
pub struct CashMovementRequest {
    pub kind: CashMovementKind,
    pub amount: Decimal,
    pub reason: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosingResponse {
    pub kind: CloseKind,
    pub expected_cash: Decimal,
    pub actual_cash: Decimal,
    pub discrepancy: Decimal,
    pub cash_counts: CashCountsBody,
    pub notes: Option<String>,
    pub override_confirmed: bool,
}

impl From<&Reconciliation> for ClosingResponse {
    fn from(r: &Reconciliation) -> Self {
        ClosingResponse {
            kind: r.kind,
            expected_cash: r.expected_cash.to_decimal(),
            actual_cash: r.actual_cash.to_decimal(),
            discrepancy: r.discrepancy.to_decimal(),
            cash_counts: CashCountsBody::from(&r.cash_counts),
            notes: r.notes.clone(),
            override_confirmed: r.override_confirmed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftResponse {
    pub id: i64,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub starting_cash: Decimal,
    pub closed_at: Option<DateTime<Utc>>,
    pub closing: Option<ClosingResponse>,
}

impl From<Shift> for ShiftResponse {
    fn from(shift: Shift) -> Self {
        ShiftResponse {
            id: shift.id,
            closing: shift.closing.as_ref().map(ClosingResponse::from),
            user_id: shift.user_id,
            started_at: shift.started_at,
            starting_cash: shift.starting_cash.to_decimal(),
            closed_at: shift.closed_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartShiftResponse {
    pub shift: ShiftResponse,
    pub closed_previous: Option<ShiftResponse>,
}

impl From<ShiftStart> for StartShiftResponse {
    fn from(start: ShiftStart) -> Self {
        StartShiftResponse {
            shift: start.shift.into(),
            closed_previous: start.closed_previous.map(ShiftResponse::from),
        }
    }
}

/// Running totals of the caller's shift; zeros when none is open.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentShiftResponse {
    pub is_open: bool,
    pub shift_id: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub starting_cash: Decimal,
    pub expected_cash: Decimal,
    pub total_sales: Decimal,
    pub cash_sales: Decimal,
    pub card_sales: Decimal,
    pub transaction_count: i64,
    pub pay_ins: Decimal,
    pub pay_outs: Decimal,
}

impl CurrentShiftResponse {
    fn new(shift: Option<&Shift>, summary: &ShiftSummary) -> Self {
        CurrentShiftResponse {
            is_open: shift.is_some(),
            shift_id: shift.map(|s| s.id),
            started_at: shift.map(|s| s.started_at),
            starting_cash: summary.starting_cash.to_decimal(),
            expected_cash: summary.expected_cash().to_decimal(),
            total_sales: summary.total_sales.to_decimal(),
            cash_sales: summary.cash_sales.to_decimal(),
            card_sales: summary.card_sales.to_decimal(),
            transaction_count: summary.transaction_count,
            pay_ins: summary.pay_ins.to_decimal(),
            pay_outs: summary.pay_outs.to_decimal(),
        }
    }
}

impl From<Option<ShiftReport>> for CurrentShiftResponse {
    fn from(report: Option<ShiftReport>) -> Self {
        match report {
            Some(r) => CurrentShiftResponse::new(Some(&r.shift), &r.summary),
            None => CurrentShiftResponse::new(None, &ShiftSummary::default()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashMovementResponse {
    pub id: i64,
    pub shift_id: i64,
    pub kind: CashMovementKind,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CashMovement> for CashMovementResponse {
    fn from(m: CashMovement) -> Self {
        CashMovementResponse {
            id: m.id,
            shift_id: m.shift_id,
            kind: m.kind,
            amount: m.amount().to_decimal(),
            reason: m.reason,
            created_at: m.created_at,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/operations/shift/start`
pub async fn start(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<StartShiftRequest>,
) -> ApiResult<Json<StartShiftResponse>> {
    user.require_any(STAFF)?;

    let starting_cash = to_money("startingCash", req.starting_cash)?;

    let close_previous = match req.close_previous {
        None => None,
        Some(prev) => {
            let submission = CloseSubmission {
                cash_counts: prev.cash_counts.into_counts()?,
                notes: prev.notes,
                confirm_discrepancy: prev.confirm_discrepancy,
            };
            Some(match prev.mode {
                CloseMode::Forced => ClosePrevious::Forced(submission),
                CloseMode::Validated => ClosePrevious::Validated(submission),
            })
        }
    };

    let started = state
        .shifts
        .start(&user.user_id, starting_cash, close_previous)
        .await?;

    Ok(Json(started.into()))
}

/// `POST /api/operations/shift/close`
pub async fn close(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CloseShiftRequest>,
) -> ApiResult<Json<ShiftResponse>> {
    user.require_any(STAFF)?;

    let submission = CloseSubmission {
        cash_counts: req.cash_counts.into_counts()?,
        notes: req.notes,
        confirm_discrepancy: req.confirm_discrepancy,
    };
    let client_actual = opt_money("actualCash", req.actual_cash)?;
    let client_discrepancy = opt_money("discrepancy", req.discrepancy)?;

    let closed = state
        .shifts
        .close(&user.user_id, submission, client_actual, client_discrepancy)
        .await?;

    Ok(Json(closed.into()))
}

/// `GET /api/operations/shift/current`
pub async fn current(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CurrentShiftResponse>> {
    let report = state.shifts.current(&user.user_id).await?;
    Ok(Json(report.into()))
}

/// `POST /api/operations/shift/cash-movements`
pub async fn add_movement(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CashMovementRequest>,
) -> ApiResult<(StatusCode, Json<CashMovementResponse>)> {
    user.require_any(STAFF)?;

    let amount = to_money("amount", req.amount)?;
    let movement = state
        .shifts
        .add_movement(&user.user_id, req.kind, amount, req.reason)
        .await?;

    Ok((StatusCode::CREATED, Json(movement.into())))
}
