//! Document lifecycle controller.
//!
//! Every mutation runs as one unit of work: document header, lines and
//! stock deltas commit together or not at all.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create      header + lines, stock per creation policy                  │
//! │  storefront  customer upsert + create                                   │
//! │  set_status  forward-only move within the type's status set             │
//! │  convert     checked decrement per line, then quote ══► invoice         │
//! │  delete      restore stock (invoice/order only), lines, header          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{info, warn};

use tally_core::lifecycle::{
    compute_totals, creatable_types, ensure_convertible, holds_stock, initial_status,
    validate_status_change, CreationPath, LineDraft, StockPolicy,
};
use tally_core::validation::{
    normalize_email, validate_lines, validate_name, validate_price_cents,
};
use tally_core::{
    Document, DocumentLine, DocumentStatus, DocumentSummary, DocumentType, PaymentMethod, TaxRate,
    ValidationError,
};
use tally_db::{Database, NewCustomer, NewDocument, NewLine, UnitOfWork};

use crate::error::{ApiError, ApiResult};
use crate::services::notification::{DocumentEvent, Notifier};

/// A till-side creation request.
#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub customer_id: Option<i64>,
    pub doc_type: DocumentType,
    pub lines: Vec<LineDraft>,
    pub payment_method: Option<PaymentMethod>,
    /// Token subject of the cashier.
    pub created_by: Option<String>,
}

/// A document with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    pub document: Document,
    pub lines: Vec<DocumentLine>,
}

/// Creation inputs shared by both paths once the customer is known.
struct Creation<'a> {
    path: CreationPath,
    doc_type: DocumentType,
    customer_id: Option<i64>,
    lines: &'a [LineDraft],
    payment_method: Option<PaymentMethod>,
    created_by: Option<String>,
}

/// Orchestrates the stock ledger and document store.
#[derive(Clone)]
pub struct DocumentLifecycle {
    db: Database,
    policy: StockPolicy,
    notifier: Notifier,
}

impl DocumentLifecycle {
    pub fn new(db: Database, policy: StockPolicy, notifier: Notifier) -> Self {
        DocumentLifecycle {
            db,
            policy,
            notifier,
        }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates a quote or invoice from the till.
    pub async fn create(&self, request: CreateDocument) -> ApiResult<Document> {
        ensure_creatable(CreationPath::PointOfSale, request.doc_type)?;
        validate_lines(&request.lines)?;

        let mut uow = self.db.begin().await?;

        let customer_email = match request.customer_id {
            Some(id) => Some(uow.customers().require(id).await?.email),
            None => None,
        };

        let doc = create_in(
            &mut uow,
            self.policy,
            Creation {
                path: CreationPath::PointOfSale,
                doc_type: request.doc_type,
                customer_id: request.customer_id,
                lines: &request.lines,
                payment_method: request.payment_method,
                created_by: request.created_by,
            },
        )
        .await?;

        uow.commit().await?;

        info!(
            id = doc.id,
            doc_type = %doc.doc_type,
            total = %doc.total(),
            lines = request.lines.len(),
            "Document created"
        );

        if let Some(event) = DocumentEvent::for_created(&doc, customer_email) {
            self.notifier.dispatch(event);
        }

        Ok(doc)
    }

    /// Public storefront checkout: upserts the customer by email and creates
    /// an order or quote at catalog prices.
    pub async fn submit_storefront(
        &self,
        customer: NewCustomer,
        doc_type: DocumentType,
        lines: Vec<LineDraft>,
    ) -> ApiResult<Document> {
        ensure_creatable(CreationPath::Storefront, doc_type)?;
        validate_name(&customer.name)?;
        let email = normalize_email(&customer.email)?;
        validate_lines(&lines)?;

        if lines.iter().any(|line| line.product_id.is_none()) {
            return Err(ValidationError::Required {
                field: "item id".to_string(),
            }
            .into());
        }

        let mut uow = self.db.begin().await?;

        let customer = uow
            .customers()
            .upsert_by_email(&NewCustomer {
                name: customer.name.trim().to_string(),
                email,
                ..customer
            })
            .await?;

        let doc = create_in(
            &mut uow,
            self.policy,
            Creation {
                path: CreationPath::Storefront,
                doc_type,
                customer_id: Some(customer.id),
                lines: &lines,
                payment_method: None,
                created_by: None,
            },
        )
        .await?;

        uow.commit().await?;

        info!(
            id = doc.id,
            doc_type = %doc.doc_type,
            customer_id = customer.id,
            total = %doc.total(),
            "Storefront document submitted"
        );

        if let Some(event) = DocumentEvent::for_created(&doc, Some(customer.email)) {
            self.notifier.dispatch(event);
        }

        Ok(doc)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Moves a document to `status`, recording the payment method if given.
    pub async fn set_status(
        &self,
        id: i64,
        status: DocumentStatus,
        payment_method: Option<PaymentMethod>,
    ) -> ApiResult<Document> {
        let mut uow = self.db.begin().await?;

        let doc = uow.documents().require(id).await?;
        validate_status_change(doc.doc_type, doc.status, status)?;

        // Quotes are never settled
        let payment_method = payment_method.filter(|_| doc.doc_type != DocumentType::Quote);

        if doc.status == status && payment_method.is_none() {
            return Ok(doc);
        }

        let updated = uow.documents().set_status(id, status, payment_method).await?;
        uow.commit().await?;

        info!(
            id,
            doc_type = %updated.doc_type,
            from = %doc.status,
            to = %updated.status,
            "Document status changed"
        );

        Ok(updated)
    }

    /// Converts a live quote into an issued invoice, taking its stock.
    ///
    /// Every catalog line is decremented with a stock check; the first
    /// shortfall aborts the whole conversion.
    pub async fn convert(&self, id: i64) -> ApiResult<Document> {
        let mut uow = self.db.begin().await?;

        let doc = uow.documents().require(id).await?;
        ensure_convertible(&doc)?;

        let lines = uow.documents().lines(id).await?;
        let check = self.policy.on_convert();

        for line in &lines {
            if let Some(product_id) = line.product_id {
                uow.stock().decrement(check, product_id, line.quantity).await?;
            }
        }

        let invoice = uow.documents().convert_to_invoice(id).await?;
        uow.commit().await?;

        info!(id, lines = lines.len(), total = %invoice.total(), "Quote converted to invoice");

        Ok(invoice)
    }

    /// Deletes a document, handing stock back for invoices and orders.
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let mut uow = self.db.begin().await?;

        let doc = uow.documents().require(id).await?;

        if holds_stock(doc.doc_type) {
            let lines = uow.documents().lines(id).await?;
            for line in &lines {
                let Some(product_id) = line.product_id else {
                    continue;
                };
                if !uow.stock().increment(product_id, line.quantity).await? {
                    warn!(
                        document_id = id,
                        product_id,
                        qty = line.quantity,
                        "Product gone, stock not restored"
                    );
                }
            }
        }

        uow.documents().delete(id).await?;
        uow.commit().await?;

        info!(id, doc_type = %doc.doc_type, "Document deleted");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get(&self, id: i64) -> ApiResult<DocumentDetail> {
        let mut session = self.db.session().await?;
        let document = session.documents().require(id).await?;
        let lines = session.documents().lines(id).await?;
        Ok(DocumentDetail { document, lines })
    }

    pub async fn list_all(&self) -> ApiResult<Vec<DocumentSummary>> {
        let mut session = self.db.session().await?;
        Ok(session.documents().list_all().await?)
    }

    /// Documents of one customer, newest first.
    pub async fn list_by_customer(&self, customer_id: i64) -> ApiResult<Vec<DocumentSummary>> {
        let mut session = self.db.session().await?;
        session.customers().require(customer_id).await?;
        Ok(session.documents().list_by_customer(customer_id).await?)
    }
}

fn ensure_creatable(path: CreationPath, doc_type: DocumentType) -> ApiResult<()> {
    let allowed = creatable_types(path);
    if allowed.contains(&doc_type) {
        return Ok(());
    }
    Err(ApiError::from(ValidationError::NotAllowed {
        field: "type".to_string(),
        allowed: allowed.iter().map(|t| t.as_str().to_string()).collect(),
    }))
}

/// Writes header, lines and stock deltas into `uow`. The caller commits.
async fn create_in(
    uow: &mut UnitOfWork,
    policy: StockPolicy,
    creation: Creation<'_>,
) -> ApiResult<Document> {
    let (outlet_id, rate) = match uow.outlets().active().await? {
        Some(outlet) => (Some(outlet.id), outlet.tax_rate()),
        None => {
            warn!("No active outlet, creating document without tax");
            (None, TaxRate::zero())
        }
    };

    // Snapshot names (and catalog prices on the storefront) at creation time
    let mut resolved = Vec::with_capacity(creation.lines.len());
    for draft in creation.lines {
        let line = match draft.product_id {
            Some(product_id) => {
                let product = uow.products().require(product_id).await?;
                let unit_price = match creation.path {
                    CreationPath::PointOfSale => draft.unit_price,
                    CreationPath::Storefront => {
                        validate_price_cents(product.price().cents())?;
                        product.price()
                    }
                };
                LineDraft {
                    product_id: Some(product_id),
                    name: Some(product.name),
                    quantity: draft.quantity,
                    unit_price,
                }
            }
            None => LineDraft {
                name: draft.name.as_deref().map(|n| n.trim().to_string()),
                ..draft.clone()
            },
        };
        resolved.push(line);
    }

    let totals = compute_totals(&resolved, rate);

    let payment_method = match creation.doc_type {
        DocumentType::Quote => None,
        _ => creation.payment_method,
    };

    let doc = uow
        .documents()
        .insert(&NewDocument {
            doc_type: creation.doc_type,
            status: initial_status(creation.doc_type),
            customer_id: creation.customer_id,
            totals,
            outlet_id,
            payment_method,
            created_by: creation.created_by,
        })
        .await?;

    for line in &resolved {
        uow.documents()
            .insert_line(
                doc.id,
                &NewLine {
                    product_id: line.product_id,
                    product_name: line.name.clone().unwrap_or_default(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                },
            )
            .await?;
    }

    let check = policy.on_create(creation.doc_type);
    for line in &resolved {
        if let Some(product_id) = line.product_id {
            uow.stock().decrement(check, product_id, line.quantity).await?;
        }
    }

    Ok(doc)
}
