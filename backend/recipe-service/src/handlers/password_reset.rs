use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{password_reset_repo, refresh_token_repo, user_repo};
use crate::error::AppError;
use crate::metrics;
use crate::security::{generate_token, hash_password, hash_token, verify_password};
use crate::services::EmailService;
use crate::validators;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

const NEUTRAL_MESSAGE: &str =
    "If your email is registered, you will receive a password reset link.";

/// Extract IP address from HTTP request
fn extract_ip_address(req: &HttpRequest) -> Option<String> {
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
    {
        // Take the first IP in the chain
        return forwarded.split(',').next().map(|s| s.trim().to_string());
    }

    if let Some(real_ip) = req.headers().get("X-Real-IP").and_then(|h| h.to_str().ok()) {
        return Some(real_ip.to_string());
    }

    req.peer_addr().map(|addr| addr.ip().to_string())
}

/// POST /api/v1/auth/password/forgot
///
/// Returns the same 200 whether or not the email exists, so the endpoint
/// does not reveal which addresses hold accounts.
pub async fn forgot_password(
    pool: web::Data<PgPool>,
    email_service: web::Data<EmailService>,
    req: web::Json<ForgotPasswordRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if !validators::validate_email(&req.email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    let neutral = HttpResponse::Ok().json(ForgotPasswordResponse {
        message: NEUTRAL_MESSAGE.to_string(),
    });

    let user = match user_repo::find_by_email(pool.get_ref(), &req.email).await? {
        Some(user) if user.is_active => user,
        // Unknown address or unactivated account: same neutral answer
        _ => return Ok(neutral),
    };

    let token = generate_token();
    let ip_address = extract_ip_address(&http_req);
    password_reset_repo::create_token(pool.get_ref(), user.id, &hash_token(&token), ip_address)
        .await?;

    if let Err(e) = email_service
        .send_password_reset_email(&user.email, &token)
        .await
    {
        tracing::warn!(user_id = %user.id, error = %e, "failed to send password reset email");
    }

    metrics::PASSWORD_RESET_TOTAL.with_label_values(&["requested"]).inc();
    Ok(neutral)
}

/// POST /api/v1/auth/password/reset
///
/// Consumes a valid, unused, unexpired reset token and sets the new
/// password. All outstanding reset and refresh tokens die with it.
pub async fn reset_password(
    pool: web::Data<PgPool>,
    req: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    if req.token.is_empty() || req.token.len() > 1000 {
        return Err(AppError::BadRequest("Invalid token".to_string()));
    }
    if !req.token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::BadRequest("Invalid token format".to_string()));
    }

    if !validators::validate_password(&req.new_password) {
        return Err(AppError::Validation(
            "Password must be at least 8 characters with upper and lower case letters, a digit and a symbol".to_string(),
        ));
    }

    let reset_token =
        password_reset_repo::find_by_token(pool.get_ref(), &hash_token(&req.token))
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired token".to_string()))?;

    if reset_token.is_used {
        return Err(AppError::BadRequest(
            "This reset token has already been used".to_string(),
        ));
    }

    if reset_token.expires_at < Utc::now() {
        return Err(AppError::BadRequest(
            "This reset token has expired".to_string(),
        ));
    }

    let user = user_repo::find_by_id(pool.get_ref(), reset_token.user_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired token".to_string()))?;

    // Prevent reuse of the current password
    if verify_password(&req.new_password, &user.password_hash)? {
        return Err(AppError::Validation(
            "New password must differ from the current password".to_string(),
        ));
    }

    let new_hash = hash_password(&req.new_password)?;
    user_repo::update_password(pool.get_ref(), user.id, &new_hash).await?;

    password_reset_repo::mark_as_used(pool.get_ref(), reset_token.id).await?;
    password_reset_repo::delete_user_tokens(pool.get_ref(), user.id).await?;
    refresh_token_repo::revoke_all_for_user(pool.get_ref(), user.id).await?;

    metrics::PASSWORD_RESET_TOTAL.with_label_values(&["completed"]).inc();
    tracing::info!(user_id = %user.id, "password reset completed");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password reset successfully"
    })))
}
