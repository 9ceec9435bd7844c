//! Error types for the HTTP API.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CoreError::*NotFound, DbError::NotFound         → 404                  │
//! │  Validation, transitions, stock, reconciliation  → 400                  │
//! │  Unique violations, shift already open/closed    → 409                  │
//! │  Missing / bad token                             → 401                  │
//! │  Role not allowed                                → 403                  │
//! │  Storage failures                                → 500 (generic text)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error body is `{"error": "<message>"}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use tally_core::{CoreError, ReconciliationError, ValidationError};
use tally_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Detail is logged, never sent to the client.
    #[error("Internal server error")]
    Internal(String),
}

/// Result type for handlers and services.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(detail = %detail, "Request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_)
            | CoreError::DocumentNotFound(_)
            | CoreError::CustomerNotFound(_) => ApiError::NotFound(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ReconciliationError> for ApiError {
    fn from(err: ReconciliationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::Conflict(err.to_string()),
            DbError::Conflict(message) => ApiError::Conflict(message),
            DbError::ForeignKeyViolation { .. } => ApiError::BadRequest(err.to_string()),
            DbError::Domain(core) => core.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{DocumentStatus, DocumentType, Money};

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = DbError::not_found("Document", 9).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let stock: ApiError = DbError::Domain(CoreError::InsufficientStock {
            product_id: 7,
            name: "Beans".into(),
            available: 0,
            requested: 1,
        })
        .into();
        assert_eq!(stock.status(), StatusCode::BAD_REQUEST);

        let transition: ApiError = CoreError::InvalidTransition {
            doc_type: DocumentType::Invoice,
            from: DocumentStatus::Paid,
            to: DocumentStatus::Issued,
        }
        .into();
        assert_eq!(transition.status(), StatusCode::BAD_REQUEST);

        let open: ApiError = DbError::Conflict("A shift is already open".into()).into();
        assert_eq!(open.status(), StatusCode::CONFLICT);

        let rec: ApiError = ReconciliationError::NoteRequired {
            discrepancy: Money::from_cents(-4550),
        }
        .into();
        assert_eq!(rec.to_string(), "A note is required to close with a discrepancy of -$45.50");
    }

    #[test]
    fn test_storage_failures_hide_detail() {
        let err: ApiError = DbError::QueryFailed("disk I/O error".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }
}
