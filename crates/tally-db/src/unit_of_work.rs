//! # Unit of Work
//!
//! One SQLite transaction spanning every write of a lifecycle operation,
//! held together with the database's write gate.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.begin()                                                             │
//! │    │  lock write gate (other writers wait here)                         │
//! │    │  BEGIN                                                             │
//! │    ▼                                                                    │
//! │  uow.documents().insert(..)          ┐                                  │
//! │  uow.documents().insert_line(..)     │ all on the same connection       │
//! │  uow.stock().decrement_checked(..)   ┘                                  │
//! │    │                                                                    │
//! │    ├── Ok  ──► uow.commit()  ──► COMMIT, gate released                  │
//! │    │                                                                    │
//! │    └── Err ──► `?` drops uow ──► ROLLBACK, gate released                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a unit of work without calling [`UnitOfWork::commit`] rolls it
//! back. Fields drop in declaration order, so the transaction is gone before
//! the gate opens for the next writer.

use sqlx::{Sqlite, Transaction};
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::customer::CustomerRepository;
use crate::repository::document::DocumentStore;
use crate::repository::outlet::OutletRepository;
use crate::repository::product::ProductRepository;
use crate::repository::shift::ShiftRepository;
use crate::repository::stock::StockLedger;

/// A write transaction holding the write gate.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
    _gate: OwnedMutexGuard<()>,
}

impl UnitOfWork {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>, gate: OwnedMutexGuard<()>) -> Self {
        UnitOfWork { tx, _gate: gate }
    }

    /// Stock ledger bound to this transaction.
    pub fn stock(&mut self) -> StockLedger<'_> {
        StockLedger::new(&mut self.tx)
    }

    /// Product catalog reads inside this transaction.
    pub fn products(&mut self) -> ProductRepository<'_> {
        ProductRepository::new(&mut self.tx)
    }

    /// Document store bound to this transaction.
    pub fn documents(&mut self) -> DocumentStore<'_> {
        DocumentStore::new(&mut self.tx)
    }

    pub fn customers(&mut self) -> CustomerRepository<'_> {
        CustomerRepository::new(&mut self.tx)
    }

    pub fn outlets(&mut self) -> OutletRepository<'_> {
        OutletRepository::new(&mut self.tx)
    }

    pub fn shifts(&mut self) -> ShiftRepository<'_> {
        ShiftRepository::new(&mut self.tx)
    }

    /// Commits every write made through this unit of work.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Unit of work committed");
        Ok(())
    }

    /// Discards every write made through this unit of work.
    ///
    /// Same effect as dropping it, but reports a failed rollback.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Unit of work rolled back");
        Ok(())
    }
}
