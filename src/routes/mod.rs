mod auth;
mod health_check;
mod reset;
mod user;
mod verify;

pub use auth::issue_access_token;
pub use auth::register;
pub use auth::revoke_access_token;
pub use health_check::health_check;
pub use reset::confirm_password_reset;
pub use reset::request_password_reset;
pub use user::get_current_user;
pub use user::update_current_user;
pub use verify::confirm_verification;
pub use verify::request_verification;

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Request body carrying a bare token (revoke, verification confirm).
#[derive(Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

/// The tuple handed to the notification subsystem and returned by the
/// reset/verify request endpoints.
#[derive(Serialize)]
pub struct TokenWithEmail {
    pub token: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Extracts the bearer token from the Authorization header.
pub(crate) fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::validation("token", "is required"))?;

    let value = header
        .to_str()
        .map_err(|_| AuthError::validation("token", "has invalid format"))?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .ok_or_else(|| AuthError::validation("token", "has invalid format"))?;

    if token.is_empty() {
        return Err(AuthError::validation("token", "is required"));
    }

    Ok(token)
}
