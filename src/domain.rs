//! Core domain types shared by the repositories and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted user row. Never serialized directly; the hashed password
/// stays inside the crate.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub first_name: String,
    pub last_name: String,
    pub account_type_id: Uuid,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The closed set of token namespaces. Each kind has its own table and
/// its own configured lifetime; the row shape is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Reset,
    Verify,
}

impl TokenKind {
    /// Table backing this kind. Token strings are unique per kind.
    pub fn table(&self) -> &'static str {
        match self {
            TokenKind::Access => "access_tokens",
            TokenKind::Reset => "reset_tokens",
            TokenKind::Verify => "verify_tokens",
        }
    }
}

/// A persisted token. The opaque string is the primary key; a row's
/// existence with `expires_at >= now` is the sole validity condition.
#[derive(Debug, Clone, FromRow)]
pub struct Token {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// User representation returned at the boundary, with the account type
/// and its scope names loaded.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub account_type: AccountTypeRecord,
    pub is_active: bool,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountTypeRecord {
    pub name: String,
    pub scopes: Vec<String>,
}
