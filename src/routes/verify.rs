//! Account verification: token request and single-use confirm.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::TokenKind;
use crate::email_client::EmailClient;
use crate::error::AuthError;
use crate::repos::{ConsumeMutation, TokenRepository, UserRepository};
use crate::routes::{TokenRequest, TokenWithEmail};
use crate::validators::normalize_email;

#[derive(Deserialize)]
pub struct VerifyTokenRequest {
    pub email: String,
}

/// POST /auth/verify/token
///
/// Issues a verification token. Requesting one for an account that is
/// already verified is refused.
pub async fn request_verification(
    form: web::Json<VerifyTokenRequest>,
    users: web::Data<UserRepository>,
    tokens: web::Data<TokenRepository>,
    email_client: web::Data<Option<EmailClient>>,
) -> Result<HttpResponse, AuthError> {
    let email = normalize_email(&form.email)?;
    let user = users.get_by_email(&email).await?;

    if user.is_verified {
        return Err(AuthError::AlreadyInDesiredState(
            "user is already verified".to_string(),
        ));
    }

    let token = tokens.create(TokenKind::Verify, user.id).await?;

    if let Some(client) = email_client.get_ref() {
        if let Err(e) = client
            .send_verification(&user.email, &user.first_name, &user.last_name, &token.token)
            .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "verification email not delivered");
        }
    }

    tracing::info!(user_id = %user.id, "verification token issued");

    Ok(HttpResponse::Ok().json(TokenWithEmail {
        token: token.token,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}

/// POST /auth/verify
///
/// Consumes the verification token and marks the account verified in
/// one atomic step; remaining verify tokens for the user are
/// invalidated with it.
pub async fn confirm_verification(
    form: web::Json<TokenRequest>,
    users: web::Data<UserRepository>,
    tokens: web::Data<TokenRepository>,
) -> Result<HttpResponse, AuthError> {
    if form.token.is_empty() {
        return Err(AuthError::validation("token", "is required"));
    }

    let user = tokens
        .consume(TokenKind::Verify, &form.token, ConsumeMutation::MarkVerified)
        .await?;

    let record = users.load_record(&user).await?;

    Ok(HttpResponse::Ok().json(record))
}
