//! Input validation for logical keys, identifiers and values.

use crate::core::constants::SEPARATOR;
use crate::error::{Result, ValidationError};

/// Validate a logical secret key.
///
/// Logical keys follow the uppercase identifier convention:
/// - Only A-Z, 0-9, and underscore
/// - Cannot start with a digit
/// - Cannot be empty
///
/// # Errors
///
/// Returns `ValidationError` if the key is invalid.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(ValidationError::EmptyKey.into());
    }

    if let Some(first_char) = key.chars().next() {
        if first_char.is_ascii_digit() {
            return Err(ValidationError::InvalidKey {
                key: key.to_string(),
                reason: "cannot start with a digit".to_string(),
            }
            .into());
        }
    }

    for (i, ch) in key.chars().enumerate() {
        if !(ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_') {
            return Err(ValidationError::InvalidKey {
                key: key.to_string(),
                reason: format!(
                    "invalid character '{}' at position {}. Only A-Z, 0-9, and underscore are allowed",
                    ch,
                    i + 1
                ),
            }
            .into());
        }
    }

    Ok(())
}

/// Validate a secret value.
///
/// # Errors
///
/// Returns `ValidationError::EmptyValue` if the value is empty.
pub fn validate_value(key: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ValidationError::EmptyValue(key.to_string()).into());
    }

    Ok(())
}

/// Check a prefix or project identifier used inside physical names.
///
/// Returns the reason it is unusable, or `None` when it is fine. An
/// identifier may not contain the separator nor begin or end with `-`,
/// otherwise splitting a physical name back into parts becomes ambiguous.
pub fn identifier_problem(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some("cannot be empty".to_string());
    }
    if let Some(ch) = value
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
    {
        return Some(format!("invalid character '{}'", ch));
    }
    if value.contains(SEPARATOR) {
        return Some(format!("cannot contain '{}'", SEPARATOR));
    }
    if value.starts_with('-') || value.ends_with('-') {
        return Some("cannot begin or end with '-'".to_string());
    }
    None
}

/// Normalize an imported key to the logical-key convention.
///
/// Uppercases and maps `.` and `-` to `_`, so `db.host` becomes `DB_HOST`.
pub fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|ch| match ch {
            '.' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}
