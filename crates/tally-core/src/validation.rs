//! # Validation Module
//!
//! Input validation for document submissions and shift operations.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Front end (React)     - format checks, instant feedback      │
//! │  Layer 2: tally-api             - JSON shape (serde)                   │
//! │           THIS MODULE           - business rule validation             │
//! │  Layer 3: SQLite                - NOT NULL / UNIQUE / FOREIGN KEY      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::lifecycle::LineDraft;
use crate::money::Money;
use crate::{MAX_AMOUNT_CENTS, MAX_DOCUMENT_LINES, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: `1..=MAX_ITEM_QUANTITY`.
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

/// Validates a unit price in cents: `0..=MAX_AMOUNT_CENTS`.
///
/// ```rust
/// use tally_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());  // $10.99
/// assert!(validate_price_cents(0).is_ok());     // Free item
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    validate_non_negative("price", Money::from_cents(cents))
}

/// Validates a non-negative amount no larger than `MAX_AMOUNT_CENTS`.
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    validate_ceiling(field, amount)
}

/// Validates a strictly positive amount (drawer movements).
pub fn validate_positive(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    validate_ceiling(field, amount)
}

fn validate_ceiling(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

// =============================================================================
// Document Validators
// =============================================================================

/// Validates the lines of a document submission.
///
/// ## Rules
/// - At least one line, at most `MAX_DOCUMENT_LINES`
/// - Every quantity within range, every price within `0..=MAX_AMOUNT_CENTS`
/// - Free-text lines (no product) must carry a name
pub fn validate_lines(lines: &[LineDraft]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines.len() > MAX_DOCUMENT_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_DOCUMENT_LINES as i64,
        });
    }

    for line in lines {
        validate_quantity(line.quantity)?;
        validate_price_cents(line.unit_price.cents())?;

        let has_name = line
            .name
            .as_deref()
            .map(|n| !n.trim().is_empty())
            .unwrap_or(false);
        if line.product_id.is_none() && !has_name {
            return Err(ValidationError::Required {
                field: "item name".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer name.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates and normalizes an email address (trimmed, lowercased).
///
/// ```rust
/// use tally_core::validation::normalize_email;
///
/// assert_eq!(normalize_email(" Ana@Example.COM ").unwrap(), "ana@example.com");
/// assert!(normalize_email("not-an-email").is_err());
/// ```
pub fn normalize_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_ascii_lowercase();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid || email.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        });
    }

    Ok(email)
}

/// Validates free-text notes (shift close, drawer movements).
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    if let Some(notes) = notes {
        if notes.len() > 2000 {
            return Err(ValidationError::TooLong {
                field: "notes".to_string(),
                max: 2000,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
