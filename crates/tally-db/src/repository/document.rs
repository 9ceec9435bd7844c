//! # Document Store
//!
//! Quotes, invoices and orders share one `documents` table, tagged by
//! `type`, with their lines in `document_lines`.
//!
//! ## Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  documents                          document_lines                      │
//! │  ─────────────────────              ───────────────────────────         │
//! │  id              ◄──────────────────  document_id                       │
//! │  type   quote|invoice|order           product_id  (NULL after the       │
//! │  status                                            product is deleted)  │
//! │  customer_id                          product_name   snapshot           │
//! │  subtotal/tax/total_cents             quantity                          │
//! │  outlet_id                            unit_price_cents  snapshot        │
//! │  payment_method                       line_total_cents                  │
//! │  created_by                                                             │
//! │  created_at / updated_at                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store does not decide whether a write is allowed; the lifecycle
//! service checks the rules in `tally_core::lifecycle` first.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::lifecycle::DocumentTotals;
use tally_core::{
    Document, DocumentLine, DocumentStatus, DocumentSummary, DocumentType, Money, PaymentMethod,
};

// =============================================================================
// Inputs
// =============================================================================

/// A document header to be inserted.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
    pub customer_id: Option<i64>,
    pub totals: DocumentTotals,
    pub outlet_id: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    pub created_by: Option<String>,
}

/// A document line to be inserted, with its snapshot already resolved.
#[derive(Debug, Clone)]
pub struct NewLine {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// Sales of one staff member since a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct SalesWindow {
    pub total_cents: i64,
    pub cash_cents: i64,
    pub card_cents: i64,
    pub transaction_count: i64,
}

// =============================================================================
// Document Store
// =============================================================================

/// Repository for documents and their lines.
pub struct DocumentStore<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> DocumentStore<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        DocumentStore { conn }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets a document header by id.
    pub async fn get(&mut self, id: i64) -> DbResult<Option<Document>> {
        debug!(id = %id, "Getting document");

        let doc = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, type, status, customer_id, subtotal_cents, tax_cents, total_cents,
                   outlet_id, payment_method, created_by, created_at, updated_at
            FROM documents
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(doc)
    }

    /// Gets a document header, failing with `NotFound` when it doesn't exist.
    pub async fn require(&mut self, id: i64) -> DbResult<Document> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Document", id))
    }

    /// Lines of a document in insertion order.
    pub async fn lines(&mut self, document_id: i64) -> DbResult<Vec<DocumentLine>> {
        let lines = sqlx::query_as::<_, DocumentLine>(
            r#"
            SELECT id, document_id, product_id, product_name, quantity,
                   unit_price_cents, line_total_cents
            FROM document_lines
            WHERE document_id = ?1
            ORDER BY id
            "#,
        )
        .bind(document_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(lines)
    }

    /// Every document, newest first.
    pub async fn list_all(&mut self) -> DbResult<Vec<DocumentSummary>> {
        let docs = sqlx::query_as::<_, DocumentSummary>(
            r#"
            SELECT d.id, d.type, d.status, d.customer_id,
                   c.name AS customer_name, o.name AS outlet_name,
                   d.subtotal_cents, d.tax_cents, d.total_cents, d.created_at
            FROM documents d
            LEFT JOIN customers c ON c.id = d.customer_id
            LEFT JOIN outlets o ON o.id = d.outlet_id
            ORDER BY d.created_at DESC, d.id DESC
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await?;

        debug!(count = docs.len(), "Listed documents");
        Ok(docs)
    }

    /// Documents of one customer, newest first.
    pub async fn list_by_customer(&mut self, customer_id: i64) -> DbResult<Vec<DocumentSummary>> {
        let docs = sqlx::query_as::<_, DocumentSummary>(
            r#"
            SELECT d.id, d.type, d.status, d.customer_id,
                   c.name AS customer_name, o.name AS outlet_name,
                   d.subtotal_cents, d.tax_cents, d.total_cents, d.created_at
            FROM documents d
            LEFT JOIN customers c ON c.id = d.customer_id
            LEFT JOIN outlets o ON o.id = d.outlet_id
            WHERE d.customer_id = ?1
            ORDER BY d.created_at DESC, d.id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(docs)
    }

    /// Non-cancelled invoices and orders created by `created_by` since `since`.
    ///
    /// Documents without a payment method count towards the total but
    /// neither the cash nor the card split.
    pub async fn sales_window(
        &mut self,
        created_by: &str,
        since: DateTime<Utc>,
    ) -> DbResult<SalesWindow> {
        let window = sqlx::query_as::<_, SalesWindow>(
            r#"
            SELECT
                COALESCE(SUM(total_cents), 0) AS total_cents,
                COALESCE(SUM(CASE WHEN payment_method = 'cash' THEN total_cents ELSE 0 END), 0) AS cash_cents,
                COALESCE(SUM(CASE WHEN payment_method = 'card' THEN total_cents ELSE 0 END), 0) AS card_cents,
                COUNT(*) AS transaction_count
            FROM documents
            WHERE created_by = ?1
              AND created_at >= ?2
              AND type IN ('invoice', 'order')
              AND status != 'cancelled'
            "#,
        )
        .bind(created_by)
        .bind(since)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(window)
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Inserts a document header.
    pub async fn insert(&mut self, doc: &NewDocument) -> DbResult<Document> {
        debug!(doc_type = %doc.doc_type, total = %doc.totals.total, "Inserting document");

        let now = Utc::now();

        let inserted = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (
                type, status, customer_id, subtotal_cents, tax_cents, total_cents,
                outlet_id, payment_method, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            RETURNING id, type, status, customer_id, subtotal_cents, tax_cents, total_cents,
                      outlet_id, payment_method, created_by, created_at, updated_at
            "#,
        )
        .bind(doc.doc_type)
        .bind(doc.status)
        .bind(doc.customer_id)
        .bind(doc.totals.subtotal.cents())
        .bind(doc.totals.tax.cents())
        .bind(doc.totals.total.cents())
        .bind(doc.outlet_id)
        .bind(doc.payment_method)
        .bind(&doc.created_by)
        .bind(now)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(inserted)
    }

    /// Inserts one line of a document.
    pub async fn insert_line(&mut self, document_id: i64, line: &NewLine) -> DbResult<DocumentLine> {
        let line_total = line.unit_price.multiply_quantity(line.quantity);

        let inserted = sqlx::query_as::<_, DocumentLine>(
            r#"
            INSERT INTO document_lines (
                document_id, product_id, product_name, quantity, unit_price_cents, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, document_id, product_id, product_name, quantity,
                      unit_price_cents, line_total_cents
            "#,
        )
        .bind(document_id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(line.quantity)
        .bind(line.unit_price.cents())
        .bind(line_total.cents())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(inserted)
    }

    /// Writes a new status, and the payment method when one is given.
    pub async fn set_status(
        &mut self,
        id: i64,
        status: DocumentStatus,
        payment_method: Option<PaymentMethod>,
    ) -> DbResult<Document> {
        debug!(id = %id, status = %status, "Setting document status");

        let updated = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET status = ?2,
                payment_method = COALESCE(?3, payment_method),
                updated_at = ?4
            WHERE id = ?1
            RETURNING id, type, status, customer_id, subtotal_cents, tax_cents, total_cents,
                      outlet_id, payment_method, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(payment_method)
        .bind(Utc::now())
        .fetch_optional(&mut *self.conn)
        .await?;

        updated.ok_or_else(|| DbError::not_found("Document", id))
    }

    /// Turns a live quote into an issued invoice dated now.
    ///
    /// Matches only rows that are still non-cancelled quotes.
    pub async fn convert_to_invoice(&mut self, id: i64) -> DbResult<Document> {
        debug!(id = %id, "Converting quote to invoice");

        let converted = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET type = 'invoice', status = 'issued', created_at = ?2, updated_at = ?2
            WHERE id = ?1 AND type = 'quote' AND status != 'cancelled'
            RETURNING id, type, status, customer_id, subtotal_cents, tax_cents, total_cents,
                      outlet_id, payment_method, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&mut *self.conn)
        .await?;

        converted.ok_or_else(|| DbError::Conflict(format!("Document {id} is not a convertible quote")))
    }

    /// Deletes the lines, then the header.
    pub async fn delete(&mut self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Deleting document");

        sqlx::query("DELETE FROM document_lines WHERE document_id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        let result = sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Document", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use tally_core::lifecycle::{compute_totals, LineDraft};
    use tally_core::TaxRate;

    fn header(doc_type: DocumentType, status: DocumentStatus, subtotal_cents: i64) -> NewDocument {
        let draft = LineDraft {
            product_id: None,
            name: Some("Misc".into()),
            quantity: 1,
            unit_price: Money::from_cents(subtotal_cents),
        };
        NewDocument {
            doc_type,
            status,
            customer_id: None,
            totals: compute_totals(&[draft], TaxRate::zero()),
            outlet_id: None,
            payment_method: None,
            created_by: Some("staff-1".into()),
        }
    }

    fn line(product_id: Option<i64>, quantity: i64, cents: i64) -> NewLine {
        NewLine {
            product_id,
            product_name: "Beans 1kg".into(),
            quantity,
            unit_price: Money::from_cents(cents),
        }
    }

    #[tokio::test]
    async fn test_insert_with_lines() {
        let db = fixtures::database().await;
        let pid = fixtures::product(&db, "Beans 1kg", 3200, 10).await;

        let mut uow = db.begin().await.unwrap();
        let doc = uow
            .documents()
            .insert(&header(DocumentType::Invoice, DocumentStatus::Issued, 6400))
            .await
            .unwrap();
        uow.documents()
            .insert_line(doc.id, &line(Some(pid), 2, 3200))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let mut session = db.session().await.unwrap();
        let lines = session.documents().lines(doc.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_total().cents(), 6400);
        assert_eq!(doc.total().cents(), 6400);
        assert_eq!(doc.doc_type, DocumentType::Invoice);
    }

    #[tokio::test]
    async fn test_failed_line_insert_rolls_back_everything() {
        let db = fixtures::database().await;
        let pid = fixtures::product(&db, "Beans 1kg", 3200, 10).await;

        let result: DbResult<()> = async {
            let mut uow = db.begin().await?;
            let doc = uow
                .documents()
                .insert(&header(DocumentType::Invoice, DocumentStatus::Issued, 3200))
                .await?;
            uow.documents().insert_line(doc.id, &line(Some(pid), 1, 3200)).await?;
            uow.stock().decrement_checked(pid, 1).await?;
            // quantity 0 violates the CHECK constraint mid-batch
            uow.documents().insert_line(doc.id, &line(Some(pid), 0, 3200)).await?;
            uow.commit().await
        }
        .await;

        assert!(result.is_err());

        let mut session = db.session().await.unwrap();
        assert!(session.documents().list_all().await.unwrap().is_empty());
        drop(session);
        assert_eq!(fixtures::stock_of(&db, pid).await, 10);
    }

    #[tokio::test]
    async fn test_set_status_keeps_payment_method_unless_given() {
        let db = fixtures::database().await;
        let mut uow = db.begin().await.unwrap();

        let doc = uow
            .documents()
            .insert(&header(DocumentType::Invoice, DocumentStatus::Issued, 1000))
            .await
            .unwrap();

        let paid = uow
            .documents()
            .set_status(doc.id, DocumentStatus::Paid, Some(PaymentMethod::Card))
            .await
            .unwrap();
        assert_eq!(paid.payment_method, Some(PaymentMethod::Card));

        let again = uow
            .documents()
            .set_status(doc.id, DocumentStatus::Paid, None)
            .await
            .unwrap();
        assert_eq!(again.payment_method, Some(PaymentMethod::Card));

        assert!(matches!(
            uow.documents().set_status(999, DocumentStatus::Paid, None).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_convert_only_matches_live_quotes() {
        let db = fixtures::database().await;
        let mut uow = db.begin().await.unwrap();

        let quote = uow
            .documents()
            .insert(&header(DocumentType::Quote, DocumentStatus::Sent, 1000))
            .await
            .unwrap();

        let invoice = uow.documents().convert_to_invoice(quote.id).await.unwrap();
        assert_eq!(invoice.doc_type, DocumentType::Invoice);
        assert_eq!(invoice.status, DocumentStatus::Issued);
        assert!(invoice.created_at >= quote.created_at);

        assert!(matches!(
            uow.documents().convert_to_invoice(quote.id).await,
            Err(DbError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_lines_and_header() {
        let db = fixtures::database().await;
        let mut uow = db.begin().await.unwrap();

        let doc = uow
            .documents()
            .insert(&header(DocumentType::Quote, DocumentStatus::Draft, 500))
            .await
            .unwrap();
        uow.documents().insert_line(doc.id, &line(None, 1, 500)).await.unwrap();

        uow.documents().delete(doc.id).await.unwrap();
        assert!(uow.documents().get(doc.id).await.unwrap().is_none());
        assert!(uow.documents().lines(doc.id).await.unwrap().is_empty());
        assert!(matches!(
            uow.documents().delete(doc.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first_with_names() {
        let db = fixtures::database().await;
        let mut uow = db.begin().await.unwrap();

        let first = uow
            .documents()
            .insert(&header(DocumentType::Quote, DocumentStatus::Draft, 100))
            .await
            .unwrap();
        let second = uow
            .documents()
            .insert(&header(DocumentType::Invoice, DocumentStatus::Issued, 200))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let mut session = db.session().await.unwrap();
        let all = session.documents().list_all().await.unwrap();
        let ids: Vec<i64> = all.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(all[0].customer_name.is_none());
        assert!(session.documents().list_by_customer(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sales_window_splits_by_payment_method() {
        let db = fixtures::database().await;
        let since = Utc::now();
        let mut uow = db.begin().await.unwrap();

        let mut cash = header(DocumentType::Invoice, DocumentStatus::Paid, 1000);
        cash.payment_method = Some(PaymentMethod::Cash);
        let mut card = header(DocumentType::Order, DocumentStatus::Issued, 2500);
        card.payment_method = Some(PaymentMethod::Card);
        let quote = header(DocumentType::Quote, DocumentStatus::Draft, 9900);
        let mut other_staff = header(DocumentType::Invoice, DocumentStatus::Paid, 700);
        other_staff.created_by = Some("staff-2".into());

        for doc in [&cash, &card, &quote, &other_staff] {
            uow.documents().insert(doc).await.unwrap();
        }
        let cancelled = uow.documents().insert(&cash).await.unwrap();
        uow.documents()
            .set_status(cancelled.id, DocumentStatus::Cancelled, None)
            .await
            .unwrap();

        let window = uow.documents().sales_window("staff-1", since).await.unwrap();
        assert_eq!(
            window,
            SalesWindow {
                total_cents: 3500,
                cash_cents: 1000,
                card_cents: 2500,
                transaction_count: 2,
            }
        );
    }
}
