//! Self-service password reset: token request and single-use confirm.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::validate_password;
use crate::domain::TokenKind;
use crate::email_client::EmailClient;
use crate::error::AuthError;
use crate::repos::{hash_password_blocking, ConsumeMutation, TokenRepository, UserRepository};
use crate::routes::TokenWithEmail;
use crate::validators::normalize_email;

#[derive(Deserialize)]
pub struct ResetTokenRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ConfirmResetRequest {
    pub token: String,
    pub password: String,
}

/// POST /auth/reset-password/token
///
/// Issues a reset token for the account behind the email and hands the
/// tuple to the delivery service when one is configured. Delivery is
/// out of band; a delivery failure does not fail the request.
pub async fn request_password_reset(
    form: web::Json<ResetTokenRequest>,
    users: web::Data<UserRepository>,
    tokens: web::Data<TokenRepository>,
    email_client: web::Data<Option<EmailClient>>,
) -> Result<HttpResponse, AuthError> {
    let email = normalize_email(&form.email)?;
    let user = users.get_by_email(&email).await?;

    let token = tokens.create(TokenKind::Reset, user.id).await?;

    if let Some(client) = email_client.get_ref() {
        if let Err(e) = client
            .send_password_reset(&user.email, &user.first_name, &user.last_name, &token.token)
            .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "reset email not delivered");
        }
    }

    tracing::info!(user_id = %user.id, "password reset token issued");

    Ok(HttpResponse::Ok().json(TokenWithEmail {
        token: token.token,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}

/// POST /auth/reset-password
///
/// Consumes the reset token and stores the new password digest in one
/// atomic step; any other outstanding reset tokens for the user are
/// invalidated with it.
pub async fn confirm_password_reset(
    form: web::Json<ConfirmResetRequest>,
    tokens: web::Data<TokenRepository>,
) -> Result<HttpResponse, AuthError> {
    if form.token.is_empty() {
        return Err(AuthError::validation("token", "is required"));
    }
    validate_password(&form.password)?;

    let digest = hash_password_blocking(form.password.clone()).await?;

    tokens
        .consume(
            TokenKind::Reset,
            &form.token,
            ConsumeMutation::SetPasswordDigest(digest),
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}
