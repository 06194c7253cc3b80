/// Post repository - database operations for the post content type
use crate::models::{Post, PostCategory};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct NewPost<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub category: Option<PostCategory>,
    pub image: Option<&'a str>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
}

pub struct PostChanges<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub category: Option<PostCategory>,
    pub image: Option<&'a str>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_by: Uuid,
}

pub async fn create_post(pool: &PgPool, new_post: NewPost<'_>) -> Result<Post, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (id, title, body, category, image, published_at, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, title, body, category, image, published_at, created_by, created_at, updated_by, updated_at
        "#,
    )
    .bind(id)
    .bind(new_post.title)
    .bind(new_post.body)
    .bind(new_post.category)
    .bind(new_post.image)
    .bind(new_post.published_at.unwrap_or(now))
    .bind(new_post.created_by)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, body, category, image, published_at, created_by, created_at, updated_by, updated_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// List posts newest-first
pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, body, category, image, published_at, created_by, created_at, updated_by, updated_at
        FROM posts
        ORDER BY published_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
}

pub async fn update_post(
    pool: &PgPool,
    id: Uuid,
    changes: PostChanges<'_>,
) -> Result<Option<Post>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET title = $1, body = $2, category = $3, image = $4,
            published_at = COALESCE($5, published_at),
            updated_by = $6, updated_at = $7
        WHERE id = $8
        RETURNING id, title, body, category, image, published_at, created_by, created_at, updated_by, updated_at
        "#,
    )
    .bind(changes.title)
    .bind(changes.body)
    .bind(changes.category)
    .bind(changes.image)
    .bind(changes.published_at)
    .bind(changes.updated_by)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Delete a post. Returns true when a row was removed.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
