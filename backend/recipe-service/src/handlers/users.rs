use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::user_repo;
use crate::error::AppError;
use crate::handlers::load_principal;
use crate::middleware::UserId;
use crate::models::User;
use crate::security::require_owner;

/// Public projection of a user record; never exposes the password hash or
/// privilege flags.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            date_joined: user.date_joined,
        }
    }
}

/// Owner/superuser view of a profile.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_staff: user.is_staff,
            is_active: user.is_active,
            date_joined: user.date_joined,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(max = 30))]
    #[serde(default)]
    pub first_name: String,

    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
}

/// GET /api/v1/users/{id}
/// Profile detail, restricted to the profile owner or a superuser.
pub async fn get_user(
    pool: web::Data<PgPool>,
    caller: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let target_id = path.into_inner();
    let (_, principal) = load_principal(pool.get_ref(), caller.0).await?;
    require_owner(&principal, target_id)?;

    let user = user_repo::find_by_id(pool.get_ref(), target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ProfileResponse::from(&user)))
}

/// PUT /api/v1/users/{id}
/// Profile update, restricted to the profile owner or a superuser.
pub async fn update_user(
    pool: web::Data<PgPool>,
    caller: UserId,
    path: web::Path<Uuid>,
    req: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let target_id = path.into_inner();
    req.validate()?;

    let (_, principal) = load_principal(pool.get_ref(), caller.0).await?;
    require_owner(&principal, target_id)?;

    let target = user_repo::find_by_id(pool.get_ref(), target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let new_email = req.email.to_lowercase();
    if new_email != target.email && user_repo::email_exists(pool.get_ref(), &new_email).await? {
        return Err(AppError::Conflict(
            "Email address already registered".to_string(),
        ));
    }

    let updated = user_repo::update_profile(
        pool.get_ref(),
        target_id,
        &new_email,
        &req.first_name,
        &req.last_name,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ProfileResponse::from(&updated)))
}
