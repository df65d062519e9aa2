//! Password hashing and verification.
//!
//! bcrypt with the default work factor. The [6, 72] bound is in bytes,
//! not code points: 72 bytes is the maximum input bcrypt admits.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AuthError;

const MIN_PASSWORD_BYTES: usize = 6;
const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password with bcrypt.
///
/// Fails with a validation error when the byte length is outside
/// [6, 72]; a failure of the hash function itself is `Internal`.
/// Deliberately CPU-expensive: callers on the async runtime should run
/// this through `tokio::task::spawn_blocking`.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    validate_password(password)?;

    hash(password, DEFAULT_COST)
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {}", e)))
}

/// Verify a password against a stored bcrypt digest.
///
/// A mismatch is `false`, never an error. Neither the password nor the
/// digest is ever logged.
pub fn verify_password(password: &str, digest: &str) -> bool {
    verify(password, digest).unwrap_or(false)
}

/// Byte-length bound on plaintext passwords.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_BYTES || password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::validation(
            "password",
            format!(
                "must be between {} and {} bytes in length",
                MIN_PASSWORD_BYTES, MAX_PASSWORD_BYTES
            ),
        ));
    }
    Ok(())
}
