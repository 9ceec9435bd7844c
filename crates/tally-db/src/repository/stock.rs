//! # Stock Ledger
//!
//! The only code that writes `products.stock`.
//!
//! ## Checked Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products                                                        │
//! │     SET stock = stock - :qty                                            │
//! │   WHERE id = :id AND stock >= :qty                                      │
//! │                                                                         │
//! │  rows affected = 1  → done                                              │
//! │  rows affected = 0  → product missing or stock too low                  │
//! │                       (one SELECT to say which, for the error message)  │
//! │                                                                         │
//! │  The check and the write are one statement, so two requests can never   │
//! │  both pass the check against the same last unit.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger never commits. Whatever it does is kept or discarded with the
//! enclosing [`crate::UnitOfWork`].

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use tally_core::lifecycle::StockCheck;
use tally_core::CoreError;

/// Stock mutations within a unit of work.
pub struct StockLedger<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> StockLedger<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        StockLedger { conn }
    }

    /// Takes `qty` out of stock only if at least `qty` is on hand.
    ///
    /// ## Errors
    /// - `Domain(ProductNotFound)` - no such product
    /// - `Domain(InsufficientStock)` - fewer than `qty` on hand
    pub async fn decrement_checked(&mut self, product_id: i64, qty: i64) -> DbResult<()> {
        debug!(product_id = %product_id, qty = %qty, "Checked stock decrement");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?1, updated_at = ?3
            WHERE id = ?2 AND stock >= ?1
            "#,
        )
        .bind(qty)
        .bind(product_id)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing changed; read only to explain why
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT name, stock FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *self.conn)
                .await?;

        let err = match row {
            None => CoreError::ProductNotFound(product_id),
            Some((name, available)) => CoreError::InsufficientStock {
                product_id,
                name,
                available,
                requested: qty,
            },
        };
        Err(DbError::Domain(err))
    }

    /// Takes `qty` out of stock, letting it go negative.
    ///
    /// Returns the stock left after the decrement.
    pub async fn decrement_unchecked(&mut self, product_id: i64, qty: i64) -> DbResult<i64> {
        debug!(product_id = %product_id, qty = %qty, "Unchecked stock decrement");

        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - ?1, updated_at = ?3
            WHERE id = ?2
            RETURNING stock
            "#,
        )
        .bind(qty)
        .bind(product_id)
        .bind(Utc::now())
        .fetch_optional(&mut *self.conn)
        .await?;

        let remaining = remaining.ok_or(DbError::Domain(CoreError::ProductNotFound(product_id)))?;

        if remaining < 0 {
            warn!(product_id = %product_id, stock = remaining, "Stock oversold");
        }

        Ok(remaining)
    }

    /// Takes `qty` out of stock the way `check` says.
    pub async fn decrement(&mut self, check: StockCheck, product_id: i64, qty: i64) -> DbResult<()> {
        match check {
            StockCheck::Untouched => Ok(()),
            StockCheck::Checked => self.decrement_checked(product_id, qty).await,
            StockCheck::Oversell => self.decrement_unchecked(product_id, qty).await.map(|_| ()),
        }
    }

    /// Puts `qty` back into stock.
    ///
    /// Returns `false` when the product no longer exists.
    pub async fn increment(&mut self, product_id: i64, qty: i64) -> DbResult<bool> {
        debug!(product_id = %product_id, qty = %qty, "Restoring stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?1, updated_at = ?3
            WHERE id = ?2
            "#,
        )
        .bind(qty)
        .bind(product_id)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_checked_decrement_within_stock() {
        let db = fixtures::database().await;
        let id = fixtures::product(&db, "Beans 1kg", 3200, 5).await;

        let mut uow = db.begin().await.unwrap();
        uow.stock().decrement_checked(id, 5).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(fixtures::stock_of(&db, id).await, 0);
    }

    #[tokio::test]
    async fn test_checked_decrement_rejects_over_stock() {
        let db = fixtures::database().await;
        let id = fixtures::product(&db, "Beans 1kg", 3200, 2).await;

        let mut uow = db.begin().await.unwrap();
        let err = uow.stock().decrement_checked(id, 3).await.unwrap_err();
        drop(uow);

        match err {
            DbError::Domain(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fixtures::stock_of(&db, id).await, 2);
    }

    #[tokio::test]
    async fn test_checked_decrement_missing_product() {
        let db = fixtures::database().await;

        let mut uow = db.begin().await.unwrap();
        let err = uow.stock().decrement_checked(404, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(404))));
    }

    #[tokio::test]
    async fn test_unchecked_decrement_may_go_negative() {
        let db = fixtures::database().await;
        let id = fixtures::product(&db, "Oat Milk", 450, 1).await;

        let mut uow = db.begin().await.unwrap();
        let remaining = uow.stock().decrement_unchecked(id, 3).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(remaining, -2);
        assert_eq!(fixtures::stock_of(&db, id).await, -2);
    }

    #[tokio::test]
    async fn test_increment_restores_and_reports_missing() {
        let db = fixtures::database().await;
        let id = fixtures::product(&db, "Oat Milk", 450, 1).await;

        let mut uow = db.begin().await.unwrap();
        assert!(uow.stock().increment(id, 4).await.unwrap());
        assert!(!uow.stock().increment(999, 4).await.unwrap());
        uow.commit().await.unwrap();

        assert_eq!(fixtures::stock_of(&db, id).await, 5);
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back() {
        let db = fixtures::database().await;
        let id = fixtures::product(&db, "Oat Milk", 450, 10).await;

        {
            let mut uow = db.begin().await.unwrap();
            uow.stock().decrement_checked(id, 4).await.unwrap();
            // dropped without commit
        }

        assert_eq!(fixtures::stock_of(&db, id).await, 10);
    }

    #[tokio::test]
    async fn test_concurrent_checked_decrements_never_oversell() {
        let db = fixtures::database().await;
        let id = fixtures::product(&db, "Last Croissant", 600, 1).await;

        let attempt = move |db: crate::Database| async move {
            let mut uow = db.begin().await?;
            uow.stock().decrement_checked(id, 1).await?;
            uow.commit().await
        };

        let (a, b) = tokio::join!(
            tokio::spawn(attempt(db.clone())),
            tokio::spawn(attempt(db.clone()))
        );
        let outcomes = [a.unwrap(), b.unwrap()];

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(fixtures::stock_of(&db, id).await, 0);
    }
}
