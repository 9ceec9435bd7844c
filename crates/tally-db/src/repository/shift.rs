//! # Shift Repository
//!
//! Cash-drawer sessions and their pay-ins / pay-outs.
//!
//! ## Shift Row States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  open()                     close()                                     │
//! │    │                          │                                         │
//! │    ▼                          ▼                                         │
//! │  OPEN  closed_at IS NULL ──► CLOSED  closed_at, counts, discrepancy     │
//! │        (at most one per            written once, never updated again    │
//! │         staff member)                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A partial unique index keeps one open shift per `user_id`; `close()` only
//! matches rows whose `closed_at` is still NULL.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::reconciliation::{
    CashCounts, CashMovement, CashMovementKind, CloseKind, Reconciliation, Shift,
};
use tally_core::Money;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, FromRow)]
struct ShiftRow {
    id: i64,
    user_id: String,
    started_at: DateTime<Utc>,
    starting_cash_cents: i64,
    closed_at: Option<DateTime<Utc>>,
    expected_cash_cents: Option<i64>,
    actual_cash_cents: Option<i64>,
    discrepancy_cents: Option<i64>,
    cash_counts: Option<String>,
    notes: Option<String>,
    close_kind: Option<CloseKind>,
    override_confirmed: bool,
}

impl ShiftRow {
    fn into_shift(self) -> DbResult<Shift> {
        let closing = match (self.closed_at, self.close_kind) {
            (Some(_), Some(kind)) => {
                let cash_counts = match self.cash_counts.as_deref() {
                    Some(json) => serde_json::from_str::<CashCounts>(json)?,
                    None => CashCounts::default(),
                };
                Some(Reconciliation {
                    kind,
                    expected_cash: Money::from_cents(self.expected_cash_cents.unwrap_or(0)),
                    actual_cash: Money::from_cents(self.actual_cash_cents.unwrap_or(0)),
                    discrepancy: Money::from_cents(self.discrepancy_cents.unwrap_or(0)),
                    cash_counts,
                    notes: self.notes,
                    override_confirmed: self.override_confirmed,
                })
            }
            _ => None,
        };

        Ok(Shift {
            id: self.id,
            user_id: self.user_id,
            started_at: self.started_at,
            starting_cash: Money::from_cents(self.starting_cash_cents),
            closed_at: self.closed_at,
            closing,
        })
    }
}

const SHIFT_COLUMNS: &str = "id, user_id, started_at, starting_cash_cents, closed_at, \
     expected_cash_cents, actual_cash_cents, discrepancy_cents, cash_counts, notes, \
     close_kind, override_confirmed";

// =============================================================================
// Shift Repository
// =============================================================================

/// Repository for shifts and drawer movements.
pub struct ShiftRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ShiftRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ShiftRepository { conn }
    }

    /// The open shift of `user_id`, if any.
    pub async fn current(&mut self, user_id: &str) -> DbResult<Option<Shift>> {
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE user_id = ?1 AND closed_at IS NULL"
        );

        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *self.conn)
            .await?;

        row.map(ShiftRow::into_shift).transpose()
    }

    /// Gets a shift by id.
    pub async fn get(&mut self, id: i64) -> DbResult<Option<Shift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1");

        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        row.map(ShiftRow::into_shift).transpose()
    }

    /// Opens a shift for `user_id`.
    ///
    /// ## Errors
    /// - `Conflict` - the staff member already has an open shift
    pub async fn open(&mut self, user_id: &str, starting_cash: Money) -> DbResult<Shift> {
        debug!(user_id = %user_id, starting_cash = %starting_cash, "Opening shift");

        let sql = format!(
            "INSERT INTO shifts (user_id, started_at, starting_cash_cents) \
             VALUES (?1, ?2, ?3) RETURNING {SHIFT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(user_id)
            .bind(Utc::now())
            .bind(starting_cash.cents())
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => {
                    DbError::Conflict("A shift is already open for this user".to_string())
                }
                other => other,
            })?;

        row.into_shift()
    }

    /// Writes the closing record of an open shift.
    ///
    /// ## Errors
    /// - `Conflict` - the shift is already closed
    /// - `NotFound` - no such shift
    pub async fn close(&mut self, shift_id: i64, closing: &Reconciliation) -> DbResult<Shift> {
        debug!(shift_id = %shift_id, kind = ?closing.kind, "Closing shift");

        let counts = serde_json::to_string(&closing.cash_counts)?;
        let sql = format!(
            "UPDATE shifts SET \
                 closed_at = ?2, expected_cash_cents = ?3, actual_cash_cents = ?4, \
                 discrepancy_cents = ?5, cash_counts = ?6, notes = ?7, close_kind = ?8, \
                 override_confirmed = ?9 \
             WHERE id = ?1 AND closed_at IS NULL \
             RETURNING {SHIFT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(shift_id)
            .bind(Utc::now())
            .bind(closing.expected_cash.cents())
            .bind(closing.actual_cash.cents())
            .bind(closing.discrepancy.cents())
            .bind(counts)
            .bind(&closing.notes)
            .bind(closing.kind)
            .bind(closing.override_confirmed)
            .fetch_optional(&mut *self.conn)
            .await?;

        match row {
            Some(row) => row.into_shift(),
            None => match self.get(shift_id).await? {
                Some(_) => Err(DbError::Conflict(format!("Shift {shift_id} is already closed"))),
                None => Err(DbError::not_found("Shift", shift_id)),
            },
        }
    }

    /// Records a pay-in or pay-out against a shift.
    pub async fn add_movement(
        &mut self,
        shift_id: i64,
        kind: CashMovementKind,
        amount: Money,
        reason: Option<&str>,
    ) -> DbResult<CashMovement> {
        debug!(shift_id = %shift_id, kind = ?kind, amount = %amount, "Recording cash movement");

        let movement = sqlx::query_as::<_, CashMovement>(
            r#"
            INSERT INTO cash_movements (shift_id, kind, amount_cents, reason, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, shift_id, kind, amount_cents, reason, created_at
            "#,
        )
        .bind(shift_id)
        .bind(kind)
        .bind(amount.cents())
        .bind(reason)
        .bind(Utc::now())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(movement)
    }

    /// Totals of `(pay_ins, pay_outs)` recorded against a shift.
    pub async fn movement_totals(&mut self, shift_id: i64) -> DbResult<(Money, Money)> {
        let (pay_ins, pay_outs): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'pay_in' THEN amount_cents ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind = 'pay_out' THEN amount_cents ELSE 0 END), 0)
            FROM cash_movements
            WHERE shift_id = ?1
            "#,
        )
        .bind(shift_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok((Money::from_cents(pay_ins), Money::from_cents(pay_outs)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use tally_core::reconciliation::{force_close, CloseSubmission};

    #[tokio::test]
    async fn test_one_open_shift_per_user() {
        let db = fixtures::database().await;
        let mut uow = db.begin().await.unwrap();

        let shift = uow.shifts().open("staff-1", Money::from_cents(20000)).await.unwrap();
        assert!(shift.is_open());
        assert_eq!(shift.starting_cash.cents(), 20000);

        let err = uow.shifts().open("staff-1", Money::zero()).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        // Another staff member has their own drawer
        assert!(uow.shifts().open("staff-2", Money::zero()).await.is_ok());
    }

    #[tokio::test]
    async fn test_close_is_written_once() {
        let db = fixtures::database().await;
        let mut uow = db.begin().await.unwrap();

        let shift = uow.shifts().open("staff-1", Money::from_cents(10000)).await.unwrap();
        let submission = CloseSubmission {
            cash_counts: CashCounts {
                hundreds: 1,
                coins: Money::from_cents(250),
                ..CashCounts::default()
            },
            notes: Some("Float left in safe".into()),
            confirm_discrepancy: false,
        };
        let closing = force_close(Money::from_cents(10000), &submission);

        let closed = uow.shifts().close(shift.id, &closing).await.unwrap();
        assert!(!closed.is_open());
        let record = closed.closing.unwrap();
        assert_eq!(record.kind, CloseKind::Forced);
        assert_eq!(record.actual_cash.cents(), 10250);
        assert_eq!(record.cash_counts.hundreds, 1);

        let err = uow.shifts().close(shift.id, &closing).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        assert!(matches!(
            uow.shifts().close(999, &closing).await,
            Err(DbError::NotFound { .. })
        ));

        // Closed shifts free the slot for a new one
        assert!(uow.shifts().current("staff-1").await.unwrap().is_none());
        assert!(uow.shifts().open("staff-1", Money::zero()).await.is_ok());
    }

    #[tokio::test]
    async fn test_movement_totals() {
        let db = fixtures::database().await;
        let mut uow = db.begin().await.unwrap();

        let shift = uow.shifts().open("staff-1", Money::zero()).await.unwrap();
        let mut shifts = uow.shifts();
        shifts
            .add_movement(shift.id, CashMovementKind::PayIn, Money::from_cents(5000), None)
            .await
            .unwrap();
        shifts
            .add_movement(shift.id, CashMovementKind::PayOut, Money::from_cents(1250), Some("Milk"))
            .await
            .unwrap();

        let (ins, outs) = shifts.movement_totals(shift.id).await.unwrap();
        assert_eq!(ins.cents(), 5000);
        assert_eq!(outs.cents(), 1250);
    }
}
