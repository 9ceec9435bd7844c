//! HTTP routes.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  /api/invoices                      GET list      POST create           │
//! │  /api/invoices/{id}                 GET detail    DELETE                │
//! │  /api/invoices/{id}/status          PUT                                 │
//! │  /api/invoices/{id}/convert         PUT                                 │
//! │  /api/customers/{id}/invoices       GET                                 │
//! │  /api/orders                        POST (public storefront)            │
//! │  /api/operations/shift/start        POST                                │
//! │  /api/operations/shift/close        POST                                │
//! │  /api/operations/shift/current      GET                                 │
//! │  /api/operations/shift/cash-movements POST                              │
//! │  /api/health                        GET (public)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts cross the wire as decimals in major units and are converted to
//! [`Money`] at this boundary.

use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, FromRequestParts};
use axum::routing::{get, post, put};
use axum::Router;
use rust_decimal::Decimal;
use tower_http::trace::TraceLayer;

use tally_core::{Money, ValidationError};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub mod documents;
pub mod health;
pub mod shift;
pub mod storefront;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/invoices",
            get(documents::list_invoices).post(documents::create_invoice),
        )
        .route(
            "/api/invoices/{id}",
            get(documents::get_invoice).delete(documents::delete_invoice),
        )
        .route("/api/invoices/{id}/status", put(documents::set_status))
        .route("/api/invoices/{id}/convert", put(documents::convert))
        .route(
            "/api/customers/{id}/invoices",
            get(documents::customer_invoices),
        )
        .route("/api/orders", post(storefront::submit))
        .route("/api/operations/shift/start", post(shift::start))
        .route("/api/operations/shift/close", post(shift::close))
        .route("/api/operations/shift/current", get(shift::current))
        .route(
            "/api/operations/shift/cash-movements",
            post(shift::add_movement),
        )
        .route("/api/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Extractors
// =============================================================================

/// JSON body whose rejections use the `{error}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters whose rejections use the `{error}` body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

// =============================================================================
// Money Conversion
// =============================================================================

/// Decimal amount from a request body, rounded to cents.
pub(crate) fn to_money(field: &str, amount: Decimal) -> ApiResult<Money> {
    Money::from_decimal(amount).ok_or_else(|| {
        ApiError::from(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "amount out of range".to_string(),
        })
    })
}

pub(crate) fn opt_money(field: &str, amount: Option<Decimal>) -> ApiResult<Option<Money>> {
    amount.map(|a| to_money(field, a)).transpose()
}

#[inline]
pub(crate) fn decimal(cents: i64) -> Decimal {
    Money::from_cents(cents).to_decimal()
}
