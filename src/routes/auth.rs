//! Access-token issuance and revocation, and user registration.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::verify_password;
use crate::domain::TokenKind;
use crate::error::AuthError;
use crate::repos::{TokenRepository, UserRepository};
use crate::routes::TokenRequest;
use crate::validators::normalize_email;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// POST /auth/token
///
/// Exchanges email and password for a bearer token. Unknown email and
/// wrong password are deliberately indistinguishable.
pub async fn issue_access_token(
    form: web::Json<CredentialsRequest>,
    users: web::Data<UserRepository>,
    tokens: web::Data<TokenRepository>,
) -> Result<HttpResponse, AuthError> {
    let email = normalize_email(&form.email)?;
    if form.password.is_empty() {
        return Err(AuthError::validation("password", "is required"));
    }

    let user = match users.get_by_email(&email).await {
        Ok(user) => user,
        Err(AuthError::NotFound(_)) => return Err(AuthError::InvalidCredentials),
        Err(e) => return Err(e),
    };

    let password = form.password.clone();
    let digest = user.hashed_password.clone();
    let password_valid = tokio::task::spawn_blocking(move || verify_password(&password, &digest))
        .await
        .map_err(|e| AuthError::Internal(format!("verification task failed: {}", e)))?;

    if !password_valid {
        tracing::warn!(user_id = %user.id, "invalid credentials attempt");
        return Err(AuthError::InvalidCredentials);
    }

    let token = tokens.create(TokenKind::Access, user.id).await?;

    tracing::info!(user_id = %user.id, "access token issued");

    Ok(HttpResponse::Ok().json(AccessTokenResponse {
        access_token: token.token,
        token_type: "bearer".to_string(),
        expires_in: tokens.ttl_seconds(TokenKind::Access),
    }))
}

/// POST /auth/revoke
///
/// Deletes the access token. Idempotent.
pub async fn revoke_access_token(
    form: web::Json<TokenRequest>,
    tokens: web::Data<TokenRepository>,
) -> Result<HttpResponse, AuthError> {
    if form.token.is_empty() {
        return Err(AuthError::validation("token", "is required"));
    }

    tokens.revoke_access_token(&form.token).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}

/// POST /auth/register
///
/// Creates a user with the default account type assigned.
pub async fn register(
    form: web::Json<RegisterRequest>,
    users: web::Data<UserRepository>,
) -> Result<HttpResponse, AuthError> {
    let user = users
        .create_user(&form.email, &form.password, &form.first_name, &form.last_name)
        .await?;

    let record = users.load_record(&user).await?;

    Ok(HttpResponse::Created().json(record))
}
