//! # Repository Module
//!
//! Repositories over a borrowed SQLite connection.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Lifecycle service                                                      │
//! │       │                                                                 │
//! │       │  uow.stock().decrement_checked(7, 5)                            │
//! │       ▼                                                                 │
//! │  StockLedger<'c> { conn: &'c mut SqliteConnection }                     │
//! │       │                                                                 │
//! │       │  UPDATE products SET stock = stock - ? WHERE ... AND stock >= ? │
//! │       ▼                                                                 │
//! │  SQLite (inside the unit of work's transaction)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository borrows its connection from a [`crate::Session`] or a
//! [`crate::UnitOfWork`], so the same code runs inside and outside a
//! transaction.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog reads and inserts
//! - [`stock::StockLedger`] - The only writer of `products.stock`
//! - [`document::DocumentStore`] - Quotes, invoices, orders and their lines
//! - [`customer::CustomerRepository`] - Customer lookup and upsert by email
//! - [`outlet::OutletRepository`] - Active outlet lookup
//! - [`shift::ShiftRepository`] - Shifts and cash drawer movements

pub mod customer;
pub mod document;
pub mod outlet;
pub mod product;
pub mod shift;
pub mod stock;

/// Test fixtures shared by the repository tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use tally_core::Money;

    use crate::repository::product::NewProduct;
    use crate::{Database, DbConfig};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Inserts a product and returns its id.
    pub async fn product(db: &Database, name: &str, price_cents: i64, stock: i64) -> i64 {
        let mut uow = db.begin().await.unwrap();
        let product = uow
            .products()
            .insert(&NewProduct {
                name: name.to_string(),
                price: Money::from_cents(price_cents),
                stock,
                category: None,
                subcategory: None,
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();
        product.id
    }

    pub async fn stock_of(db: &Database, product_id: i64) -> i64 {
        let mut session = db.session().await.unwrap();
        session
            .products()
            .get(product_id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }
}
