//! # Validation Module
//!
//! Input validation utilities for Mini Market.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler                                                 │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rule validation, before any query runs                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (stock >= 0) constraints                         │
//! │  ├── UNIQUE constraints (barcode, email)                               │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use minimarket_core::validation::{validate_barcode, validate_quantity};
//!
//! assert!(validate_barcode("5449000000996").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MIN_PASSWORD_LEN: usize = 8;

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

fn check_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    check_text("name", name, 200)
}

/// Validates a barcode.
///
/// ## Rules
/// - 4 to 32 characters
/// - Digits and ASCII letters only (EAN/UPC plus in-store codes)
///
/// ## Example
/// ```rust
/// use minimarket_core::validation::validate_barcode;
///
/// assert!(validate_barcode("5449000000996").is_ok());
/// assert!(validate_barcode("").is_err());
/// assert!(validate_barcode("has space").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(required("barcode"));
    }

    if barcode.len() < 4 {
        return Err(ValidationError::TooShort {
            field: "barcode".to_string(),
            min: 4,
        });
    }

    if barcode.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 32,
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// Empty is allowed (lists everything). Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

pub fn validate_full_name(name: &str) -> ValidationResult<()> {
    check_text("full_name", name, 120)
}

/// Loose email check: one `@` with something on both sides and a dot in
/// the domain. Deliverability is not our concern.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(required("email"));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

pub fn validate_expense_description(description: &str) -> ValidationResult<()> {
    check_text("description", description, 300)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
///
/// ## Example
/// ```rust
/// use minimarket_core::validation::validate_price_cents;
/// use minimarket_core::MAX_PRICE_CENTS;
///
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates an absolute stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a manual stock adjustment. Zero is rejected as a no-op request.
pub fn validate_stock_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::InvalidFormat {
            field: "delta".to_string(),
            reason: "must not be zero".to_string(),
        });
    }

    if !(-MAX_STOCK..=MAX_STOCK).contains(&delta) {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_STOCK,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates an expense amount in cents.
pub fn validate_amount_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

pub fn validate_low_stock_threshold(threshold: i64) -> ValidationResult<()> {
    if !(0..=10_000).contains(&threshold) {
        return Err(ValidationError::OutOfRange {
            field: "low_stock_threshold".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
