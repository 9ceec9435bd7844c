//! # Customer Repository
//!
//! Storefront submissions identify customers by email: the same address
//! always lands on the same row, and the latest name wins.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::Customer;

/// Customer details as submitted by the storefront.
///
/// `email` is expected to be normalized (trimmed, lowercased) already.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_business: bool,
}

/// Repository for customer database operations.
pub struct CustomerRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> CustomerRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        CustomerRepository { conn }
    }

    /// Gets a customer by id.
    pub async fn get(&mut self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, address, is_business, created_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by id, failing with `NotFound` when it doesn't exist.
    pub async fn require(&mut self, id: i64) -> DbResult<Customer> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Inserts the customer, or updates the name of the one with this email.
    ///
    /// Contact details of an existing customer are left alone.
    pub async fn upsert_by_email(&mut self, customer: &NewCustomer) -> DbResult<Customer> {
        debug!(email = %customer.email, "Upserting customer by email");

        let saved = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone, address, is_business, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(email) DO UPDATE SET name = excluded.name
            RETURNING id, name, email, phone, address, is_business, created_at
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.is_business)
        .bind(Utc::now())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(saved)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
