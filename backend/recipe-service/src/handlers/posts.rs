use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::post_repo::{self, NewPost, PostChanges};
use crate::error::AppError;
use crate::handlers::load_principal;
use crate::middleware::UserId;
use crate::models::{Post, PostCategory};
use crate::security::{require_owner, Principal};
use crate::services::storage::{MediaStorage, MAX_IMAGE_BYTES};
use crate::validators;

// ============================================
// Request/Response Structs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    pub category: Option<PostCategory>,
    pub image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub category: Option<PostCategory>,
    pub image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            body: post.body,
            category: post.category,
            image: post.image,
            published_at: post.published_at,
            created_by: post.created_by,
            created_at: post.created_at,
            updated_by: post.updated_by,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

fn validate_content(title: &str, body: &str) -> Result<(), AppError> {
    if !validators::validate_post_title(title) {
        return Err(AppError::Validation(format!(
            "Title must be non-empty and at most {} characters",
            validators::MAX_TITLE_CHARS
        )));
    }
    if body.trim().is_empty() {
        return Err(AppError::Validation("Body must not be empty".to_string()));
    }
    Ok(())
}

/// Update and delete are restricted to the post's creator (or a
/// superuser). Orphaned posts, whose creator account was deleted, stay
/// readable but only a superuser may touch them.
fn require_post_owner(principal: &Principal, post: &Post) -> Result<(), AppError> {
    match post.created_by {
        Some(owner_id) => require_owner(principal, owner_id),
        None if principal.is_superuser => Ok(()),
        None => Err(AppError::Authorization(
            "You do not have permission to access this resource".to_string(),
        )),
    }
}

// ============================================
// Handler Functions
// ============================================

/// GET /api/v1/posts
pub async fn list_posts(
    pool: web::Data<PgPool>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let posts = post_repo::list(pool.get_ref(), limit, offset).await?;
    let total = post_repo::count(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: posts.into_iter().map(PostResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// GET /api/v1/posts/{id}
pub async fn get_post(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let post = post_repo::find_by_id(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// POST /api/v1/posts
pub async fn create_post(
    pool: web::Data<PgPool>,
    caller: UserId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, AppError> {
    let (_, principal) = load_principal(pool.get_ref(), caller.0).await?;
    validate_content(&req.title, &req.body)?;

    let post = post_repo::create_post(
        pool.get_ref(),
        NewPost {
            title: req.title.trim(),
            body: &req.body,
            category: req.category,
            image: req.image.as_deref(),
            published_at: req.published_at,
            created_by: principal.id,
        },
    )
    .await?;

    tracing::info!(post_id = %post.id, user_id = %principal.id, "post created");
    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

/// PUT /api/v1/posts/{id}
pub async fn update_post(
    pool: web::Data<PgPool>,
    caller: UserId,
    path: web::Path<Uuid>,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let (_, principal) = load_principal(pool.get_ref(), caller.0).await?;

    let post = post_repo::find_by_id(pool.get_ref(), post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    require_post_owner(&principal, &post)?;
    validate_content(&req.title, &req.body)?;

    let updated = post_repo::update_post(
        pool.get_ref(),
        post_id,
        PostChanges {
            title: req.title.trim(),
            body: &req.body,
            category: req.category,
            image: req.image.as_deref(),
            published_at: req.published_at,
            updated_by: principal.id,
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    tracing::info!(post_id = %updated.id, user_id = %principal.id, "post updated");
    Ok(HttpResponse::Ok().json(PostResponse::from(updated)))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    pool: web::Data<PgPool>,
    storage: web::Data<MediaStorage>,
    caller: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    let (_, principal) = load_principal(pool.get_ref(), caller.0).await?;

    let post = post_repo::find_by_id(pool.get_ref(), post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    require_post_owner(&principal, &post)?;

    post_repo::delete(pool.get_ref(), post_id).await?;
    if let Some(image) = &post.image {
        storage.remove(image).await;
    }

    tracing::info!(post_id = %post_id, user_id = %principal.id, "post deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post deleted"
    })))
}

/// POST /api/v1/posts/images
///
/// Multipart upload of a single image; returns the storage key to attach
/// to a post.
pub async fn upload_image(
    pool: web::Data<PgPool>,
    storage: web::Data<MediaStorage>,
    caller: UserId,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    load_principal(pool.get_ref(), caller.0).await?;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;

        if field.name().unwrap_or("") != "image" {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_default();

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Upload read error: {}", e)))?;
            if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(AppError::BadRequest(format!(
                    "Image exceeds maximum size of {} bytes",
                    MAX_IMAGE_BYTES
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        let key = storage.save_image(&bytes, &content_type).await?;
        return Ok(HttpResponse::Created().json(serde_json::json!({
            "image": key
        })));
    }

    Err(AppError::BadRequest(
        "Missing multipart field \"image\"".to_string(),
    ))
}
