/// Refresh token repository - stored hashed, revocable per user
use crate::models::RefreshToken;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn store(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<RefreshToken, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, RefreshToken>(
        r#"
        INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, is_revoked, created_at)
        VALUES ($1, $2, $3, $4, FALSE, $5)
        RETURNING id, user_id, token_hash, expires_at, is_revoked, revoked_at, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Find a live (unrevoked, unexpired) refresh token by its hash.
pub async fn find_active_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<RefreshToken>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, RefreshToken>(
        r#"
        SELECT id, user_id, token_hash, expires_at, is_revoked, revoked_at, created_at
        FROM refresh_tokens
        WHERE token_hash = $1 AND is_revoked = FALSE AND expires_at > $2
        "#,
    )
    .bind(token_hash)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn revoke(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    sqlx::query("UPDATE refresh_tokens SET is_revoked = TRUE, revoked_at = $1 WHERE id = $2")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Revoke every live token a user holds (logout, password change/reset).
pub async fn revoke_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE refresh_tokens SET is_revoked = TRUE, revoked_at = $1 WHERE user_id = $2 AND is_revoked = FALSE",
    )
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
