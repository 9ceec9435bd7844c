//! # Outlet Repository
//!
//! Outlets are maintained by the settings screens; the document lifecycle
//! only needs the active one for its id and GST rate.

use sqlx::SqliteConnection;

use crate::error::DbResult;
use tally_core::Outlet;

/// A trading location to be created.
#[derive(Debug, Clone)]
pub struct NewOutlet {
    pub name: String,
    pub currency: String,
    pub tax_rate_bps: u32,
    pub is_active: bool,
}

/// Repository for outlet lookups.
pub struct OutletRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> OutletRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        OutletRepository { conn }
    }

    /// Returns the active outlet, if one is configured.
    ///
    /// With several flagged active, the oldest wins.
    pub async fn active(&mut self) -> DbResult<Option<Outlet>> {
        let outlet = sqlx::query_as::<_, Outlet>(
            r#"
            SELECT id, name, currency, tax_rate_bps, is_active
            FROM outlets
            WHERE is_active = 1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(outlet)
    }

    /// Inserts an outlet. Used by the seed binary and tests.
    pub async fn insert(&mut self, outlet: &NewOutlet) -> DbResult<Outlet> {
        let inserted = sqlx::query_as::<_, Outlet>(
            r#"
            INSERT INTO outlets (name, currency, tax_rate_bps, is_active)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, name, currency, tax_rate_bps, is_active
            "#,
        )
        .bind(&outlet.name)
        .bind(&outlet.currency)
        .bind(outlet.tax_rate_bps)
        .bind(outlet.is_active)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(inserted)
    }
}
