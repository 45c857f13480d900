//! Input validation helpers
//!
//! Centralized text length constants and validation functions used by the
//! CRUD handlers before anything reaches the database.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, customer, supplier, campaign, organization, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, ticket bodies
pub const MAX_NOTE_LEN: usize = 2000;

/// Short identifiers: SKU, phone, references
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Maximum lines in one order or purchase order
pub const MAX_LINE_ITEMS: usize = 200;

/// Maximum quantity per line
pub const MAX_QUANTITY: i32 = 100_000;

/// Maximum monetary amount accepted in a single field
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 2);

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        )
        .with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Minimal email shape check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(value: &str, field: &str) -> Result<(), AppError> {
    validate_required_text(value, field, MAX_EMAIL_LEN)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(
            AppError::with_message(ErrorCode::InvalidFormat, format!("{field} is not a valid email"))
                .with_detail("field", field),
        );
    }
    Ok(())
}

/// Normalize an email for storage and lookup
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Validate a new password
pub fn validate_password(value: &str) -> Result<(), AppError> {
    if value.len() < MIN_PASSWORD_LEN {
        return Err(AppError::with_message(
            ErrorCode::PasswordTooShort,
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if value.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password is too long (max {MAX_PASSWORD_LEN})"
        )));
    }
    Ok(())
}

/// Validate a non-negative monetary amount
pub fn validate_amount(value: Decimal, field: &str) -> Result<(), AppError> {
    if value.is_sign_negative() || value > MAX_AMOUNT {
        return Err(AppError::with_message(
            ErrorCode::InvalidAmount,
            format!("{field} must be between 0 and {MAX_AMOUNT}"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate a strictly positive monetary amount
pub fn validate_positive_amount(value: Decimal, field: &str) -> Result<(), AppError> {
    if value <= Decimal::ZERO {
        return Err(
            AppError::with_message(ErrorCode::InvalidAmount, format!("{field} must be positive"))
                .with_detail("field", field),
        );
    }
    validate_amount(value, field)
}

/// Validate a line quantity
pub fn validate_quantity(value: i32, field: &str) -> Result<(), AppError> {
    if value <= 0 || value > MAX_QUANTITY {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} must be between 1 and {MAX_QUANTITY}"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate a non-negative counter such as stock or reorder level
pub fn validate_non_negative(value: i32, field: &str) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} must not be negative"),
        )
        .with_detail("field", field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Widget", "name", MAX_NAME_LEN).is_ok());
        let err = validate_required_text("   ", "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        let long = "x".repeat(MAX_NAME_LEN + 1);
        let err = validate_required_text(&long, "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "notes", 5).is_ok());
        assert!(validate_optional_text(&Some("12345".into()), "notes", 5).is_ok());
        assert!(validate_optional_text(&Some("123456".into()), "notes", 5).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("ann@example.com", "email").is_ok());
        for bad in ["", "ann", "@example.com", "ann@example", "ann@@example.com", "a b@example.com"] {
            assert!(validate_email(bad, "email").is_err(), "{bad} should be rejected");
        }
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
    }

    #[test]
    fn test_password() {
        assert_eq!(
            validate_password("short").unwrap_err().code,
            ErrorCode::PasswordTooShort
        );
        assert!(validate_password("long-enough").is_ok());
    }

    #[test]
    fn test_amounts() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        assert!(validate_amount(d("0"), "price").is_ok());
        assert!(validate_amount(d("-0.01"), "price").is_err());
        assert!(validate_amount(d("10000001"), "price").is_err());
        assert!(validate_positive_amount(d("0"), "amount").is_err());
        assert!(validate_positive_amount(d("0.01"), "amount").is_ok());
    }

    #[test]
    fn test_quantity() {
        assert!(validate_quantity(1, "quantity").is_ok());
        assert!(validate_quantity(0, "quantity").is_err());
        assert!(validate_quantity(-3, "quantity").is_err());
        assert!(validate_quantity(MAX_QUANTITY + 1, "quantity").is_err());
        assert!(validate_non_negative(0, "stock").is_ok());
        assert!(validate_non_negative(-1, "stock").is_err());
    }
}
