/// Password reset token repository
use crate::models::PasswordReset;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Reset links stay valid for one hour.
const RESET_TOKEN_TTL_SECS: i64 = 3600;

/// Store a hashed reset token for a user.
pub async fn create_token(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    ip_address: Option<String>,
) -> Result<PasswordReset, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let expires_at = now + Duration::seconds(RESET_TOKEN_TTL_SECS);

    sqlx::query_as::<_, PasswordReset>(
        r#"
        INSERT INTO password_resets (id, user_id, token_hash, expires_at, is_used, ip_address, created_at)
        VALUES ($1, $2, $3, $4, FALSE, $5, $6)
        RETURNING id, user_id, token_hash, expires_at, is_used, used_at, ip_address, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(ip_address)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Find a reset token by its hash.
pub async fn find_by_token(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<PasswordReset>, sqlx::Error> {
    sqlx::query_as::<_, PasswordReset>(
        r#"
        SELECT id, user_id, token_hash, expires_at, is_used, used_at, ip_address, created_at
        FROM password_resets
        WHERE token_hash = $1
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

/// Mark a token as consumed.
pub async fn mark_as_used(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    sqlx::query("UPDATE password_resets SET is_used = TRUE, used_at = $1 WHERE id = $2")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Remove every outstanding token for a user after a successful reset.
pub async fn delete_user_tokens(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}
