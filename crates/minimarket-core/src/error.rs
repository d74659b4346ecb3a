//! # Error Types
//!
//! Domain-specific error types for minimarket-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  minimarket-core errors (this file)                                    │
//! │  ├── CoreError        - Cart and sale rule violations                  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  minimarket-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP API errors (in the server)                                       │
//! │  └── ApiError         - What the client sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart engine and sale planning.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Adding or raising a line would take more than the shelf holds.
    ///
    /// ## User Workflow
    /// ```text
    /// Rice 1kg: stock 5, already 5 in cart
    ///      │
    ///      ▼
    /// add_item(Rice)
    ///      │
    ///      ▼
    /// StockLimitExceeded { available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// Cart unchanged, cashier sees "Only 5 Rice 1kg in stock"
    /// ```
    #[error("Only {available} {name} in stock, requested {requested}")]
    StockLimitExceeded {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// The product has no line in the cart.
    #[error("Product {0} is not in the cart")]
    ProductNotInCart(String),

    /// The sale being edited has no line for this product.
    #[error("Sale item not found: {0}")]
    SaleItemNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Checkout on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Checkout without a cashier identity.
    #[error("A cashier must be identified to complete a sale")]
    CashierRequired,

    /// A subtotal, total or stock sum left the i64 range.
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),

    /// Nothing is waiting in the continue-sale slot.
    #[error("No sale is waiting to be continued")]
    NothingToResume,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any query runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid barcode, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// The same product appears twice in one edit request.
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::StockLimitExceeded {
            product_id: "p-1".to_string(),
            name: "Rice 1kg".to_string(),
            available: 5,
            requested: 6,
        };
        assert_eq!(err.to_string(), "Only 5 Rice 1kg in stock, requested 6");
        assert_eq!(
            CoreError::CashierRequired.to_string(),
            "A cashier must be identified to complete a sale"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        };
        assert_eq!(err.to_string(), "password must be at least 8 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::Required {
            field: "quantity".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
