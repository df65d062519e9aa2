//! Cascading token invalidation.
//!
//! Runs inside the same transaction as the user mutation that triggered
//! it, whichever operation that was: a changed password digest removes
//! all outstanding reset tokens, and a false-to-true verification
//! transition removes all outstanding verify tokens. The old state is
//! read explicitly and diffed; nothing is smuggled through ambient
//! context and no database triggers are involved.

use sqlx::{Postgres, Transaction};

use crate::domain::User;

pub(crate) async fn apply_rules(
    tx: &mut Transaction<'_, Postgres>,
    before: &User,
    after: &User,
) -> Result<(), sqlx::Error> {
    if before.hashed_password != after.hashed_password {
        sqlx::query("DELETE FROM reset_tokens WHERE user_id = $1")
            .bind(after.id)
            .execute(&mut *tx)
            .await?;
        tracing::info!(user_id = %after.id, "password changed, reset tokens invalidated");
    }

    if !before.is_verified && after.is_verified {
        sqlx::query("DELETE FROM verify_tokens WHERE user_id = $1")
            .bind(after.id)
            .execute(&mut *tx)
            .await?;
        tracing::info!(user_id = %after.id, "user verified, verify tokens invalidated");
    }

    Ok(())
}
