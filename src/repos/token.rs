//! Token issuance, consumption, and revocation.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::generate_token;
use crate::configuration::TokenSettings;
use crate::domain::{Token, TokenKind, User};
use crate::error::{is_unique_violation, AuthError};
use crate::repos::invalidation;

/// Bound on regenerate-and-retry when an issued token string collides
/// with an existing primary key. One collision is already astronomically
/// unlikely at 512 bits; exhausting the bound means something other than
/// chance is wrong.
const MAX_ISSUE_ATTEMPTS: u32 = 5;

const USER_COLUMNS: &str = "id, email, hashed_password, first_name, last_name, \
     account_type_id, is_active, is_verified, created_at, updated_at";

/// The user mutation applied when a single-use token is consumed.
#[derive(Debug, Clone)]
pub enum ConsumeMutation {
    /// Replace the password digest (reset flow).
    SetPasswordDigest(String),
    /// Mark the account verified (verification flow).
    MarkVerified,
}

#[derive(Clone)]
pub struct TokenRepository {
    pool: PgPool,
    lifetimes: TokenSettings,
}

impl TokenRepository {
    pub fn new(pool: PgPool, lifetimes: TokenSettings) -> Self {
        Self { pool, lifetimes }
    }

    pub fn ttl_seconds(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.lifetimes.access_ttl_seconds,
            TokenKind::Reset => self.lifetimes.reset_ttl_seconds,
            TokenKind::Verify => self.lifetimes.verify_ttl_seconds,
        }
    }

    /// Issue a token of the given kind for a user and persist it.
    ///
    /// The returned record is exactly what was stored; callers never see
    /// a token string that could diverge from the persisted row.
    pub async fn create(&self, kind: TokenKind, user_id: Uuid) -> Result<Token, AuthError> {
        let ttl = Duration::seconds(self.ttl_seconds(kind));
        let insert = format!(
            "INSERT INTO {} (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
            kind.table()
        );

        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let record = Token {
                token: generate_token(),
                user_id,
                created_at: Utc::now(),
                expires_at: Utc::now() + ttl,
            };

            match sqlx::query(&insert)
                .bind(&record.token)
                .bind(record.user_id)
                .bind(record.created_at)
                .bind(record.expires_at)
                .execute(&self.pool)
                .await
            {
                Ok(_) => return Ok(record),
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(kind = kind.table(), "token collision, regenerating");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AuthError::Internal(
            "token generation kept colliding".to_string(),
        ))
    }

    /// Delete an access token. Idempotent: revoking a token that does
    /// not exist is not an error.
    pub async fn revoke_access_token(&self, token: &str) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM access_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Atomically consume a single-use token and apply its mutation.
    ///
    /// One transaction: the owning user row is locked, a conditional
    /// delete claims the token row (the affected-row count is the
    /// optimistic check), the user is updated, and the invalidation
    /// rules run. If the token row is already gone or expired the whole
    /// operation fails with `TokenInvalid` and nothing is applied, so
    /// two concurrent consumers of the same token see exactly one
    /// success.
    pub async fn consume(
        &self,
        kind: TokenKind,
        token: &str,
        mutation: ConsumeMutation,
    ) -> Result<User, AuthError> {
        let mut tx = self.pool.begin().await?;

        let lookup = format!("SELECT user_id FROM {} WHERE token = $1", kind.table());
        let owner: Option<(Uuid,)> = sqlx::query_as(&lookup)
            .bind(token)
            .fetch_optional(&mut tx)
            .await?;

        let user_id = match owner {
            Some((user_id,)) => user_id,
            None => return Err(AuthError::TokenInvalid),
        };

        // Lock order is user row first, then token rows; every mutation
        // path that touches both takes them in this order.
        let select = format!("SELECT {} FROM users WHERE id = $1 FOR UPDATE", USER_COLUMNS);
        let before: Option<User> = sqlx::query_as(&select)
            .bind(user_id)
            .fetch_optional(&mut tx)
            .await?;
        let before = match before {
            Some(user) => user,
            // The owning user went away before we got the lock; the
            // token rows cascade with it.
            None => return Err(AuthError::TokenInvalid),
        };

        // The single-use claim. Zero affected rows means another
        // consumer spent the token first, or it expired in between.
        let claim = format!(
            "DELETE FROM {} WHERE token = $1 AND expires_at >= $2 RETURNING user_id",
            kind.table()
        );
        let claimed: Option<(Uuid,)> = sqlx::query_as(&claim)
            .bind(token)
            .bind(Utc::now())
            .fetch_optional(&mut tx)
            .await?;

        if claimed.is_none() {
            return Err(AuthError::TokenInvalid);
        }

        let mut after = before.clone();
        match mutation {
            ConsumeMutation::SetPasswordDigest(digest) => after.hashed_password = digest,
            ConsumeMutation::MarkVerified => after.is_verified = true,
        }
        after.updated_at = Utc::now();

        sqlx::query(
            "UPDATE users SET hashed_password = $1, is_verified = $2, updated_at = $3 \
             WHERE id = $4",
        )
        .bind(&after.hashed_password)
        .bind(after.is_verified)
        .bind(after.updated_at)
        .bind(after.id)
        .execute(&mut tx)
        .await?;

        invalidation::apply_rules(&mut tx, &before, &after).await?;

        tx.commit().await?;

        Ok(after)
    }
}
