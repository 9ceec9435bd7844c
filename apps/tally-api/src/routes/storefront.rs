//! Public storefront checkout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use tally_core::DocumentType;
use tally_db::NewCustomer;

use crate::error::ApiResult;
use crate::routes::documents::{CreatedResponse, ItemRequest};
use crate::routes::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub is_business: bool,
}

#[derive(Debug, Deserialize)]
pub struct StorefrontRequest {
    pub customer: CustomerRequest,
    #[serde(default)]
    pub items: Vec<ItemRequest>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
}

/// `POST /api/orders`
pub async fn submit(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<StorefrontRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let doc_type = match req.doc_type.as_deref() {
        Some(t) => t.parse::<DocumentType>()?,
        None => DocumentType::Order,
    };

    let lines = req
        .items
        .into_iter()
        .map(|item| item.into_draft(false))
        .collect::<ApiResult<Vec<_>>>()?;

    let customer = NewCustomer {
        name: req.customer.name,
        email: req.customer.email,
        phone: req.customer.phone,
        address: req.customer.address,
        is_business: req.customer.is_business,
    };

    let doc = state
        .lifecycle
        .submit_storefront(customer, doc_type, lines)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse::from(&doc))))
}
