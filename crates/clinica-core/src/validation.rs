//! Field-level validation helpers shared by entity constructors.

use crate::error::{CoreError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Email pattern: non-empty local part, `@`, dotted domain.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid email regex")
});

/// Validates an email address, returning it trimmed.
pub fn validate_email(email: &str) -> Result<String> {
    let trimmed = email.trim();
    if EMAIL_REGEX.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(CoreError::invalid_email(email))
    }
}

/// Rejects empty or whitespace-only values for a named field.
pub fn validate_non_empty(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CoreError::invalid_field(field, "must not be empty"))
    } else {
        Ok(trimmed.to_string())
    }
}
