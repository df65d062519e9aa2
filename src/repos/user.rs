//! The user directory: validated persistence of user records and the
//! token-keyed read paths.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::domain::{AccountTypeRecord, TokenKind, User, UserRecord};
use crate::error::{is_unique_violation, AuthError};
use crate::repos::invalidation;
use crate::validators::{normalize_email, required_name};

const USER_COLUMNS: &str = "id, email, hashed_password, first_name, last_name, \
     account_type_id, is_active, is_verified, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// New accounts get the account type marked as default; exactly one
    /// is expected to exist. Its absence is broken server state, not a
    /// caller mistake.
    async fn default_account_type_id(&self) -> Result<Uuid, AuthError> {
        let id: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM account_types WHERE is_default = true")
                .fetch_optional(&self.pool)
                .await?;

        id.ok_or_else(|| AuthError::Internal("no default account type exists".to_string()))
    }

    /// Create a user. All inputs are validated before anything is
    /// written; the email is stored trimmed and lower-cased.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        let first_name = required_name("first_name", first_name)?;
        let last_name = required_name("last_name", last_name)?;

        let account_type_id = self.default_account_type_id().await?;
        let hashed_password = hash_password_blocking(password.to_string()).await?;

        let insert = format!(
            "INSERT INTO users (email, hashed_password, first_name, last_name, account_type_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let user: User = sqlx::query_as(&insert)
            .bind(&email)
            .bind(&hashed_password)
            .bind(&first_name)
            .bind(&last_name)
            .bind(account_type_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::Conflict("a user with this email already exists".to_string())
                } else {
                    e.into()
                }
            })?;

        tracing::info!(user_id = %user.id, "user registered");

        Ok(user)
    }

    /// Look up a user by canonical email.
    pub async fn get_by_email(&self, email: &str) -> Result<User, AuthError> {
        let select = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user: Option<User> = sqlx::query_as(&select)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        user.ok_or_else(|| AuthError::NotFound("user not found".to_string()))
    }

    /// Resolve a token of any kind to its owning user. Read-only: a row
    /// must exist and not be past its expiry, nothing else matters.
    pub async fn get_by_token(&self, kind: TokenKind, token: &str) -> Result<User, AuthError> {
        let select = format!(
            "SELECT u.{} FROM users u JOIN {} t ON t.user_id = u.id \
             WHERE t.token = $1 AND t.expires_at >= $2",
            USER_COLUMNS.replace(", ", ", u."),
            kind.table()
        );
        let user: Option<User> = sqlx::query_as(&select)
            .bind(token)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        user.ok_or(AuthError::TokenInvalid)
    }

    pub async fn get_by_access_token(&self, token: &str) -> Result<User, AuthError> {
        self.get_by_token(TokenKind::Access, token).await
    }

    /// Persist a modified user record. The whole record is re-validated,
    /// not just the fields that changed, and the invalidation rules run
    /// against the prior row inside the same transaction.
    pub async fn update_user(&self, user: &User) -> Result<User, AuthError> {
        let email = normalize_email(&user.email)?;
        let first_name = required_name("first_name", &user.first_name)?;
        let last_name = required_name("last_name", &user.last_name)?;
        if user.hashed_password.is_empty() {
            return Err(AuthError::Internal(
                "refusing to store a user without a password digest".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {} FROM users WHERE id = $1 FOR UPDATE", USER_COLUMNS);
        let before: Option<User> = sqlx::query_as(&select)
            .bind(user.id)
            .fetch_optional(&mut tx)
            .await?;
        let before = before.ok_or_else(|| AuthError::NotFound("user not found".to_string()))?;

        let after = User {
            email,
            first_name,
            last_name,
            updated_at: Utc::now(),
            ..user.clone()
        };

        sqlx::query(
            "UPDATE users SET email = $1, hashed_password = $2, first_name = $3, \
             last_name = $4, is_verified = $5, updated_at = $6 WHERE id = $7",
        )
        .bind(&after.email)
        .bind(&after.hashed_password)
        .bind(&after.first_name)
        .bind(&after.last_name)
        .bind(after.is_verified)
        .bind(after.updated_at)
        .bind(after.id)
        .execute(&mut tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::Conflict("a user with this email already exists".to_string())
            } else {
                AuthError::from(e)
            }
        })?;

        invalidation::apply_rules(&mut tx, &before, &after).await?;

        tx.commit().await?;

        Ok(after)
    }

    /// Boundary representation: the user with account type and scope
    /// names loaded.
    pub async fn load_record(&self, user: &User) -> Result<UserRecord, AuthError> {
        let name: String = sqlx::query_scalar("SELECT name FROM account_types WHERE id = $1")
            .bind(user.account_type_id)
            .fetch_one(&self.pool)
            .await?;

        let scopes: Vec<String> = sqlx::query_scalar(
            "SELECT s.name FROM scopes s \
             JOIN account_type_scopes ats ON ats.scope_id = s.id \
             WHERE ats.account_type_id = $1 ORDER BY s.name",
        )
        .bind(user.account_type_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(UserRecord {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            account_type: AccountTypeRecord { name, scopes },
            is_active: user.is_active,
            is_verified: user.is_verified,
        })
    }
}

/// bcrypt is deliberately slow; run it off the async executor so a hash
/// in flight never stalls unrelated requests.
pub(crate) async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))?
}
