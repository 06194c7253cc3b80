use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use crate::db::{refresh_token_repo, user_repo};
use crate::error::AppError;
use crate::handlers::load_principal;
use crate::handlers::users::PublicUser;
use crate::metrics;
use crate::middleware::UserId;
use crate::security::jwt::{self, REFRESH_TOKEN_EXPIRY_SECS};
use crate::security::{hash_password, hash_token, verify_password};
use crate::services::{ActivationService, EmailService, PgActivationStore};
use crate::validators;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8))]
    pub password: String,

    #[validate(length(max = 30))]
    #[serde(default)]
    pub first_name: String,

    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ActivateResponse {
    pub message: String,
    pub user: PublicUser,
}

/// POST /api/v1/auth/register
///
/// Creates the account inactive and emails an activation link. The mail
/// send is fire-and-forget: a delivery failure is logged but the pending
/// account stands.
pub async fn register(
    pool: web::Data<PgPool>,
    email_service: web::Data<EmailService>,
    activation: web::Data<ActivationService<PgActivationStore>>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    if !validators::validate_password(&req.password) {
        metrics::REGISTRATION_TOTAL.with_label_values(&["failed"]).inc();
        return Err(AppError::Validation(
            "Password must be at least 8 characters with upper and lower case letters, a digit and a symbol".to_string(),
        ));
    }

    if user_repo::email_exists(pool.get_ref(), &req.email).await? {
        metrics::REGISTRATION_TOTAL.with_label_values(&["failed"]).inc();
        return Err(AppError::Conflict(
            "Email address already registered".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = user_repo::create_user(
        pool.get_ref(),
        &req.email,
        &req.first_name,
        &req.last_name,
        &password_hash,
    )
    .await?;

    let token = activation.mint(user.id);
    if let Err(e) = email_service.send_activation_email(&user.email, &token).await {
        tracing::warn!(user_id = %user.id, error = %e, "failed to send activation email");
    }

    metrics::REGISTRATION_TOTAL.with_label_values(&["success"]).inc();
    tracing::info!(user_id = %user.id, "user registered, activation pending");

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "Registration received. Check your email for the activation link.".to_string(),
    }))
}

/// GET /api/v1/auth/activate/{token}
///
/// All token failures collapse into one generic 400 so the endpoint
/// cannot be used to probe which user ids exist or are pending.
pub async fn activate(
    activation: web::Data<ActivationService<PgActivationStore>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let token = path.into_inner();

    match activation.verify_and_activate(&token).await {
        Ok(user) => {
            metrics::ACTIVATION_TOTAL.with_label_values(&["success"]).inc();
            Ok(HttpResponse::Ok().json(ActivateResponse {
                message: "Account activated. You can now log in.".to_string(),
                user: PublicUser::from(&user),
            }))
        }
        Err(crate::services::ActivationError::Store(e)) => Err(e),
        Err(e) => {
            metrics::ACTIVATION_TOTAL.with_label_values(&["failed"]).inc();
            tracing::warn!(reason = %e, "activation rejected");
            Err(AppError::BadRequest(
                "Invalid or expired activation link".to_string(),
            ))
        }
    }
}

/// POST /api/v1/auth/login
///
/// Unknown email, wrong password and not-yet-activated accounts all get
/// the same 401.
pub async fn login(
    pool: web::Data<PgPool>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let generic =
        || AppError::Authentication("Invalid email or password".to_string());

    let user = match user_repo::find_by_email(pool.get_ref(), &req.email).await? {
        Some(user) => user,
        None => {
            metrics::LOGIN_ATTEMPTS_TOTAL.with_label_values(&["failed"]).inc();
            return Err(generic());
        }
    };

    if !verify_password(&req.password, &user.password_hash)? {
        metrics::LOGIN_ATTEMPTS_TOTAL.with_label_values(&["failed"]).inc();
        return Err(generic());
    }

    if !user.is_active {
        metrics::LOGIN_ATTEMPTS_TOTAL.with_label_values(&["failed"]).inc();
        tracing::warn!(user_id = %user.id, "login attempt on inactive account");
        return Err(generic());
    }

    let tokens = jwt::generate_token_pair(user.id, &user.email)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    refresh_token_repo::store(
        pool.get_ref(),
        user.id,
        &hash_token(&tokens.refresh_token),
        Utc::now() + Duration::seconds(REFRESH_TOKEN_EXPIRY_SECS),
    )
    .await?;

    metrics::LOGIN_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();
    Ok(HttpResponse::Ok().json(tokens))
}

/// POST /api/v1/auth/refresh
///
/// Exchanges a live refresh token for a fresh pair. Tokens rotate: the
/// presented one is revoked on success.
pub async fn refresh(
    pool: web::Data<PgPool>,
    req: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let invalid =
        || AppError::Authentication("Invalid or expired refresh token".to_string());

    let token_data = jwt::validate_token(&req.refresh_token).map_err(|_| invalid())?;
    if token_data.claims.token_type != "refresh" {
        return Err(invalid());
    }

    let stored =
        refresh_token_repo::find_active_by_hash(pool.get_ref(), &hash_token(&req.refresh_token))
            .await?
            .ok_or_else(invalid)?;

    let (user, _) = load_principal(pool.get_ref(), stored.user_id).await?;

    refresh_token_repo::revoke(pool.get_ref(), stored.id).await?;

    let tokens = jwt::generate_token_pair(user.id, &user.email)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    refresh_token_repo::store(
        pool.get_ref(),
        user.id,
        &hash_token(&tokens.refresh_token),
        Utc::now() + Duration::seconds(REFRESH_TOKEN_EXPIRY_SECS),
    )
    .await?;

    Ok(HttpResponse::Ok().json(tokens))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    pool: web::Data<PgPool>,
    caller: UserId,
) -> Result<HttpResponse, AppError> {
    let revoked = refresh_token_repo::revoke_all_for_user(pool.get_ref(), caller.0).await?;
    tracing::debug!(user_id = %caller.0, revoked, "refresh tokens revoked on logout");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out"
    })))
}

/// POST /api/v1/auth/password/change
pub async fn change_password(
    pool: web::Data<PgPool>,
    caller: UserId,
    req: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let (user, _) = load_principal(pool.get_ref(), caller.0).await?;

    if !verify_password(&req.current_password, &user.password_hash)? {
        return Err(AppError::Authentication(
            "Current password is incorrect".to_string(),
        ));
    }

    if !validators::validate_password(&req.new_password) {
        return Err(AppError::Validation(
            "Password must be at least 8 characters with upper and lower case letters, a digit and a symbol".to_string(),
        ));
    }

    if verify_password(&req.new_password, &user.password_hash)? {
        return Err(AppError::Validation(
            "New password must differ from the current password".to_string(),
        ));
    }

    let new_hash = hash_password(&req.new_password)?;
    user_repo::update_password(pool.get_ref(), user.id, &new_hash).await?;

    // Existing sessions do not survive a password change
    refresh_token_repo::revoke_all_for_user(pool.get_ref(), user.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password changed"
    })))
}
