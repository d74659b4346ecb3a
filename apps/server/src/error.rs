//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Mini Market                            │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                    │
//! │       │                                                                 │
//! │       ├── CoreError (cart rule)      ──┐                               │
//! │       ├── DbError (query, stock guard) ─┼──► ApiError { code, message } │
//! │       └── ValidationError (input)    ──┘          │                    │
//! │                                                   ▼                    │
//! │                                   HTTP status + JSON body              │
//! │                                                                         │
//! │  Database internals are logged here and replaced by a generic message. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Body
//! ```json
//! { "code": "STOCK_LIMIT_EXCEEDED", "message": "Only 5 Rice 1kg in stock, requested 6" }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use minimarket_core::{CoreError, ValidationError};
use minimarket_db::DbError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Cart line would exceed the shelf (409)
    StockLimitExceeded,

    /// Stock guard rejected a commit (409)
    InsufficientStock,

    /// Duplicate or still-referenced row (409)
    Conflict,

    /// Cart cannot be checked out as it is (422)
    CartError,

    /// Business rule rejected the request (422)
    BusinessLogic,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::StockLimitExceeded | ErrorCode::InsufficientStock | ErrorCode::Conflict => {
                StatusCode::CONFLICT
            }
            ErrorCode::CartError | ErrorCode::BusinessLogic => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            e @ DbError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            DbError::Conflict(message) => ApiError::new(ErrorCode::Conflict, message),
            DbError::Core(e) => ApiError::from(e),
            DbError::InvalidSnapshot(message) => {
                ApiError::validation(format!("Invalid snapshot: {}", message))
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::StockLimitExceeded { .. } => {
                ApiError::new(ErrorCode::StockLimitExceeded, message)
            }
            CoreError::ProductNotInCart(_) | CoreError::SaleItemNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, message)
            }
            CoreError::CartTooLarge { .. } | CoreError::EmptyCart => {
                ApiError::new(ErrorCode::CartError, message)
            }
            CoreError::QuantityTooLarge { .. }
            | CoreError::AmountOutOfRange(_)
            | CoreError::Validation(_) => ApiError::new(ErrorCode::ValidationError, message),
            CoreError::CashierRequired | CoreError::NothingToResume => {
                ApiError::new(ErrorCode::BusinessLogic, message)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_errors_are_conflicts() {
        let err = ApiError::from(DbError::insufficient_stock("p-1", 2, 3));
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.code.status(), StatusCode::CONFLICT);

        let err = ApiError::from(CoreError::StockLimitExceeded {
            product_id: "p-1".to_string(),
            name: "Rice".to_string(),
            available: 5,
            requested: 6,
        });
        assert_eq!(err.code, ErrorCode::StockLimitExceeded);
        assert_eq!(err.message, "Only 5 Rice in stock, requested 6");
    }

    #[test]
    fn test_core_inside_db_error() {
        let err = ApiError::from(DbError::Core(CoreError::CashierRequired));
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(err.code.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_amount_out_of_range_is_bad_request() {
        let err = ApiError::from(CoreError::AmountOutOfRange("sale total".to_string()));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = ApiError::from(DbError::QueryFailed("no such column: foo".to_string()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("foo"));
    }

    #[test]
    fn test_not_found() {
        let err = ApiError::from(DbError::not_found("Sale", "s-9"));
        assert_eq!(err.code.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Sale not found: s-9");
    }

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_string(&ApiError::new(ErrorCode::StockLimitExceeded, "x")).unwrap();
        assert_eq!(json, r#"{"code":"STOCK_LIMIT_EXCEEDED","message":"x"}"#);
    }
}
