//! Input validators.
//!
//! Pure functions over borrowed input; no shared validator instance.
//! All validation runs before any write is attempted.

use lazy_static::lazy_static;

use crate::error::AuthError;

const MAX_EMAIL_LENGTH: usize = 320; // RFC 5321 path limit
const MAX_NAME_LENGTH: usize = 120;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: regex::Regex = regex::Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Normalizes and validates an email address. The canonical form is
/// whitespace-trimmed and lower-cased; that is what gets stored and what
/// lookups key on.
pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();

    if email.is_empty() {
        return Err(AuthError::validation("email", "is required"));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(AuthError::validation(
            "email",
            format!("is too long (maximum {} characters)", MAX_EMAIL_LENGTH),
        ));
    }

    if !EMAIL_REGEX.is_match(&email) {
        return Err(AuthError::validation("email", "has invalid format"));
    }

    Ok(email)
}

/// Validates a required name field (first or last name): trimmed,
/// non-empty, bounded length.
pub fn required_name(field: &'static str, raw: &str) -> Result<String, AuthError> {
    let name = raw.trim();

    if name.is_empty() {
        return Err(AuthError::validation(field, "is required"));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(AuthError::validation(
            field,
            format!("is too long (maximum {} characters)", MAX_NAME_LENGTH),
        ));
    }

    Ok(name.to_string())
}
