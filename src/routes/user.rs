//! The bearer-token read and update paths for the current user.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::error::AuthError;
use crate::repos::{hash_password_blocking, UserRepository};
use crate::routes::bearer_token;

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

/// GET /auth/me
pub async fn get_current_user(
    req: HttpRequest,
    users: web::Data<UserRepository>,
) -> Result<HttpResponse, AuthError> {
    let token = bearer_token(&req)?;
    let user = users.get_by_access_token(token).await?;
    let record = users.load_record(&user).await?;

    Ok(HttpResponse::Ok().json(record))
}

/// PATCH /auth/me
///
/// Partial update: absent or empty fields keep their current value. The
/// whole record is re-validated before persisting, and a password
/// change invalidates outstanding reset tokens as part of the same
/// transaction.
pub async fn update_current_user(
    req: HttpRequest,
    form: web::Json<UpdateUserRequest>,
    users: web::Data<UserRepository>,
) -> Result<HttpResponse, AuthError> {
    let token = bearer_token(&req)?;
    let mut user = users.get_by_access_token(token).await?;

    if let Some(email) = provided(&form.email) {
        user.email = email.to_string();
    }
    if let Some(first_name) = provided(&form.first_name) {
        user.first_name = first_name.to_string();
    }
    if let Some(last_name) = provided(&form.last_name) {
        user.last_name = last_name.to_string();
    }
    if let Some(password) = provided(&form.password) {
        user.hashed_password = hash_password_blocking(password.to_string()).await?;
    }

    let user = users.update_user(&user).await?;
    let record = users.load_record(&user).await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Empty strings mean "leave unchanged", same as absent fields.
fn provided(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
