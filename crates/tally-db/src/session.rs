//! # Read Session
//!
//! A pooled connection for queries that don't need the write gate.
//! Sessions run in parallel with each other and with the current writer.

use sqlx::pool::PoolConnection;
use sqlx::Sqlite;

use crate::repository::customer::CustomerRepository;
use crate::repository::document::DocumentStore;
use crate::repository::outlet::OutletRepository;
use crate::repository::product::ProductRepository;
use crate::repository::shift::ShiftRepository;

/// A pooled connection used for reads.
///
/// The stock ledger is only reachable through a [`crate::UnitOfWork`].
pub struct Session {
    conn: PoolConnection<Sqlite>,
}

impl Session {
    pub(crate) fn new(conn: PoolConnection<Sqlite>) -> Self {
        Session { conn }
    }

    pub fn products(&mut self) -> ProductRepository<'_> {
        ProductRepository::new(&mut self.conn)
    }

    pub fn documents(&mut self) -> DocumentStore<'_> {
        DocumentStore::new(&mut self.conn)
    }

    pub fn customers(&mut self) -> CustomerRepository<'_> {
        CustomerRepository::new(&mut self.conn)
    }

    pub fn outlets(&mut self) -> OutletRepository<'_> {
        OutletRepository::new(&mut self.conn)
    }

    pub fn shifts(&mut self) -> ShiftRepository<'_> {
        ShiftRepository::new(&mut self.conn)
    }
}
