//! Back-office document endpoints (quotes, invoices, orders).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_core::lifecycle::LineDraft;
use tally_core::{
    Document, DocumentLine, DocumentStatus, DocumentSummary, DocumentType, Money, PaymentMethod,
    ValidationError,
};

use crate::auth::{AuthUser, MANAGERS, STAFF};
use crate::error::ApiResult;
use crate::routes::{decimal, to_money, JsonBody, PathParam};
use crate::services::{CreateDocument, DocumentDetail};
use crate::state::AppState;

// =============================================================================
// Request Bodies
// =============================================================================

/// One submitted line. `id` is the product; omit it for a free-text line.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub id: Option<i64>,
    pub quantity: i64,
    pub price: Option<Decimal>,
    pub name: Option<String>,
}

impl ItemRequest {
    /// Line draft with the submitted price; a missing price is an error
    /// unless `price_required` is false (storefront lines use catalog prices).
    pub(crate) fn into_draft(self, price_required: bool) -> ApiResult<LineDraft> {
        let unit_price = match self.price {
            Some(price) => to_money("price", price)?,
            None if price_required => {
                return Err(ValidationError::Required {
                    field: "price".to_string(),
                }
                .into())
            }
            None => Money::zero(),
        };

        Ok(LineDraft {
            product_id: self.id,
            name: self.name,
            quantity: self.quantity,
            unit_price,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub items: Vec<ItemRequest>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub status: String,
    pub payment_method: Option<PaymentMethod>,
}

// =============================================================================
// Responses
// =============================================================================

/// Body returned by both creation endpoints.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub id: i64,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
}

impl From<&Document> for CreatedResponse {
    fn from(doc: &Document) -> Self {
        CreatedResponse {
            id: doc.id,
            subtotal: decimal(doc.subtotal_cents),
            tax_amount: decimal(doc.tax_cents),
            total: decimal(doc.total_cents),
            doc_type: doc.doc_type,
            status: doc.status,
        }
    }
}

/// List row. Kept in snake_case for the existing POS tables.
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryRow {
    pub id: i64,
    pub total: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub outlet_name: Option<String>,
}

impl From<DocumentSummary> for SummaryRow {
    fn from(s: DocumentSummary) -> Self {
        SummaryRow {
            id: s.id,
            total: decimal(s.total_cents),
            subtotal: decimal(s.subtotal_cents),
            tax_amount: decimal(s.tax_cents),
            created_at: s.created_at,
            doc_type: s.doc_type,
            status: s.status,
            customer_id: s.customer_id,
            customer_name: s.customer_name,
            outlet_name: s.outlet_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResponse {
    pub id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<DocumentLine> for LineResponse {
    fn from(line: DocumentLine) -> Self {
        LineResponse {
            id: line.id,
            product_id: line.product_id,
            product_name: line.product_name,
            quantity: line.quantity,
            unit_price: decimal(line.unit_price_cents),
            line_total: decimal(line.line_total_cents),
        }
    }
}

/// A document header, with its lines on the detail endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
    pub customer_id: Option<i64>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub outlet_id: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<LineResponse>>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        DocumentResponse {
            id: doc.id,
            doc_type: doc.doc_type,
            status: doc.status,
            customer_id: doc.customer_id,
            subtotal: decimal(doc.subtotal_cents),
            tax_amount: decimal(doc.tax_cents),
            total: decimal(doc.total_cents),
            outlet_id: doc.outlet_id,
            payment_method: doc.payment_method,
            created_by: doc.created_by,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            items: None,
        }
    }
}

impl From<DocumentDetail> for DocumentResponse {
    fn from(detail: DocumentDetail) -> Self {
        DocumentResponse {
            items: Some(detail.lines.into_iter().map(LineResponse::from).collect()),
            ..DocumentResponse::from(detail.document)
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/invoices`
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreateInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    user.require_any(STAFF)?;

    let doc_type = match req.doc_type.as_deref() {
        Some(t) => t.parse::<DocumentType>()?,
        None => DocumentType::Invoice,
    };

    let lines = req
        .items
        .into_iter()
        .map(|item| item.into_draft(true))
        .collect::<ApiResult<Vec<_>>>()?;

    let doc = state
        .lifecycle
        .create(CreateDocument {
            customer_id: req.customer_id,
            doc_type,
            lines,
            payment_method: req.payment_method,
            created_by: Some(user.user_id),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse::from(&doc))))
}

/// `GET /api/invoices`
pub async fn list_invoices(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<SummaryRow>>> {
    let rows = state.lifecycle.list_all().await?;
    Ok(Json(rows.into_iter().map(SummaryRow::from).collect()))
}

/// `GET /api/invoices/{id}`
pub async fn get_invoice(
    State(state): State<AppState>,
    _user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<DocumentResponse>> {
    let detail = state.lifecycle.get(id).await?;
    Ok(Json(detail.into()))
}

/// `PUT /api/invoices/{id}/status`
pub async fn set_status(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<StatusRequest>,
) -> ApiResult<Json<DocumentResponse>> {
    user.require_any(STAFF)?;

    let status = req.status.parse::<DocumentStatus>()?;
    let doc = state
        .lifecycle
        .set_status(id, status, req.payment_method)
        .await?;

    Ok(Json(doc.into()))
}

/// `PUT /api/invoices/{id}/convert`
pub async fn convert(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<DocumentResponse>> {
    user.require_any(STAFF)?;

    let doc = state.lifecycle.convert(id).await?;
    Ok(Json(doc.into()))
}

/// `DELETE /api/invoices/{id}`
pub async fn delete_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    user.require_any(MANAGERS)?;

    state.lifecycle.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/customers/{id}/invoices`
pub async fn customer_invoices(
    State(state): State<AppState>,
    _user: AuthUser,
    PathParam(customer_id): PathParam<i64>,
) -> ApiResult<Json<Vec<SummaryRow>>> {
    let rows = state.lifecycle.list_by_customer(customer_id).await?;
    Ok(Json(rows.into_iter().map(SummaryRow::from).collect()))
}
