//! # Product Repository
//!
//! Catalog reads and inserts. Stock changes go through
//! [`crate::repository::stock::StockLedger`].

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Money, Product};

/// A product to be added to the catalog.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    /// Opening stock.
    pub stock: i64,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

/// Repository for product database operations.
pub struct ProductRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ProductRepository<'c> {
    /// Creates a new ProductRepository.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ProductRepository { conn }
    }

    /// Gets a product by id.
    pub async fn get(&mut self, id: i64) -> DbResult<Option<Product>> {
        debug!(id = %id, "Getting product by ID");

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, stock, category, subcategory, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(product)
    }

    /// Gets a product by id, failing with `NotFound` when it doesn't exist.
    pub async fn require(&mut self, id: i64) -> DbResult<Product> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Lists products by name.
    pub async fn list(&mut self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, stock, category, subcategory, created_at, updated_at
            FROM products
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&mut self, product: &NewProduct) -> DbResult<Product> {
        debug!(name = %product.name, stock = product.stock, "Inserting product");

        let now = Utc::now();

        let inserted = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price_cents, stock, category, subcategory, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING id, name, price_cents, stock, category, subcategory, created_at, updated_at
            "#,
        )
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.stock)
        .bind(&product.category)
        .bind(&product.subcategory)
        .bind(now)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(inserted)
    }

    /// Counts products (for diagnostics and the seed binary).
    pub async fn count(&mut self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = fixtures::database().await;
        let id = fixtures::product(&db, "Flat White", 550, 12).await;

        let mut session = db.session().await.unwrap();
        let product = session.products().require(id).await.unwrap();
        assert_eq!(product.name, "Flat White");
        assert_eq!(product.price().cents(), 550);
        assert_eq!(product.stock, 12);
        assert_eq!(session.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_require_missing_product() {
        let db = fixtures::database().await;
        let mut session = db.session().await.unwrap();

        let err = session.products().require(999).await.unwrap_err();
        assert_eq!(err.to_string(), "Product not found: 999");
    }
}
