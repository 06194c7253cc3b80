/// User repository - handles all database operations for users
use crate::models::User;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new user. Registrations start inactive; the activation flow
/// flips the flag once the emailed token is verified.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    first_name: &str,
    last_name: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, first_name, last_name, password_hash, is_staff, is_superuser, is_active, date_joined, updated_at)
        VALUES ($1, $2, $3, $4, $5, FALSE, FALSE, FALSE, $6, $6)
        RETURNING id, email, first_name, last_name, password_hash, is_staff, is_superuser, is_active, date_joined, updated_at
        "#,
    )
    .bind(id)
    .bind(email.to_lowercase())
    .bind(first_name)
    .bind(last_name)
    .bind(password_hash)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Find a user by email
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, first_name, last_name, password_hash, is_staff, is_superuser, is_active, date_joined, updated_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email.to_lowercase())
    .fetch_optional(pool)
    .await
}

/// Find a user by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, first_name, last_name, password_hash, is_staff, is_superuser, is_active, date_joined, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Check if email is already taken
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email.to_lowercase())
        .fetch_one(pool)
        .await
}

/// Compare-and-set activation: flips is_active only when it is still
/// FALSE, so concurrent verifications of the same token converge without
/// double-processing. Returns None when no pending row matched (user
/// missing or already active).
pub async fn activate(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET is_active = TRUE, updated_at = $1
        WHERE id = $2 AND is_active = FALSE
        RETURNING id, email, first_name, last_name, password_hash, is_staff, is_superuser, is_active, date_joined, updated_at
        "#,
    )
    .bind(now)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Update profile fields
pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET email = $1, first_name = $2, last_name = $3, updated_at = $4
        WHERE id = $5
        RETURNING id, email, first_name, last_name, password_hash, is_staff, is_superuser, is_active, date_joined, updated_at
        "#,
    )
    .bind(email.to_lowercase())
    .bind(first_name)
    .bind(last_name)
    .bind(now)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Update a user's password
pub async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    new_password_hash: &str,
) -> Result<User, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET password_hash = $1, updated_at = $2
        WHERE id = $3
        RETURNING id, email, first_name, last_name, password_hash, is_staff, is_superuser, is_active, date_joined, updated_at
        "#,
    )
    .bind(new_password_hash)
    .bind(now)
    .bind(user_id)
    .fetch_one(pool)
    .await
}
