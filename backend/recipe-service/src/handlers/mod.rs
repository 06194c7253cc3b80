pub mod auth;
pub mod health;
pub mod password_reset;
pub mod posts;
pub mod users;

use crate::db::user_repo;
use crate::error::AppError;
use crate::models::User;
use crate::security::Principal;
use sqlx::PgPool;
use uuid::Uuid;

/// Load the calling user's fresh record and build their principal.
///
/// Privilege flags come from the database on every request, never from
/// token claims; deactivated accounts are refused even while their access
/// token is still formally valid.
pub(crate) async fn load_principal(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<(User, Principal), AppError> {
    let user = user_repo::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::Authentication("Account no longer exists".to_string()))?;

    if !user.is_active {
        return Err(AppError::Authentication(
            "Account is not active".to_string(),
        ));
    }

    let principal = Principal {
        id: user.id,
        is_superuser: user.is_superuser,
    };
    Ok((user, principal))
}
