//! Account activation tokens.
//!
//! Registration creates users inactive; the activation email carries a
//! signed, self-contained token over the user's primary key. Verifying
//! the token flips the account active exactly once. No token state is
//! persisted: the signature and embedded timestamp are the whole record.

use crate::db::user_repo;
use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;
use chrono::Duration;
use signing_core::{SigningError, TimestampSigner};
use sqlx::PgPool;
use uuid::Uuid;

/// Persistence seam for the activation flow.
#[async_trait]
pub trait ActivationStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Activate the user only if still pending. Returns the updated row,
    /// or None when no pending user matched (missing or already active).
    async fn activate_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
}

/// Production store backed by the users table.
#[derive(Clone)]
pub struct PgActivationStore {
    pool: PgPool,
}

impl PgActivationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivationStore for PgActivationStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(user_repo::find_by_id(&self.pool, id).await?)
    }

    async fn activate_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(user_repo::activate(&self.pool, id).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("activation token is invalid")]
    InvalidToken,

    #[error("activation token has expired")]
    ExpiredToken,

    #[error("activation token references an unknown user")]
    UnknownUser,

    #[error("account is already active")]
    AlreadyActive,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl ActivationError {
    /// True for the client-caused variants (as opposed to store failures).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ActivationError::Store(_))
    }
}

/// Issues and redeems activation tokens.
///
/// The signer secret and maximum token age are injected at construction;
/// nothing here reads process-wide configuration.
pub struct ActivationService<S> {
    signer: TimestampSigner,
    max_age: Duration,
    store: S,
}

impl<S: ActivationStore> ActivationService<S> {
    pub fn new(signer: TimestampSigner, max_age_secs: i64, store: S) -> Self {
        Self {
            signer,
            max_age: Duration::seconds(max_age_secs),
            store,
        }
    }

    /// Mint an activation token for a user. Pure computation over
    /// (user id, current time, secret); no side effects.
    pub fn mint(&self, user_id: Uuid) -> String {
        self.signer.sign(&user_id.to_string())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Verify a token and activate the referenced user.
    ///
    /// The activation write is a compare-and-set, so two racing requests
    /// with the same still-valid token converge on `is_active = true`:
    /// the first writer wins and the loser sees `AlreadyActive`.
    pub async fn verify_and_activate(&self, token: &str) -> Result<User, ActivationError> {
        let payload = self.signer.unsign(token, self.max_age).map_err(|e| match e {
            SigningError::BadSignature => ActivationError::InvalidToken,
            SigningError::Expired { .. } => ActivationError::ExpiredToken,
        })?;

        let user_id = Uuid::parse_str(&payload).map_err(|_| ActivationError::InvalidToken)?;

        if let Some(user) = self.store.activate_user(user_id).await? {
            tracing::info!(user_id = %user.id, "account activated");
            return Ok(user);
        }

        // No pending row: distinguish a missing user from a repeat
        // verification, without touching the flag again.
        match self.store.find_user(user_id).await? {
            None => Err(ActivationError::UnknownUser),
            Some(_) => Err(ActivationError::AlreadyActive),
        }
    }
}
