//! End-to-end tests for the activation token flow over an in-memory
//! user store: mint → verify → active, expiry, tampering, idempotence.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use recipe_service::error::AppError;
use recipe_service::models::User;
use recipe_service::services::{ActivationError, ActivationService, ActivationStore};
use signing_core::TimestampSigner;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

const SECRET: &str = "activation-test-secret";
const DAY_SECS: i64 = 24 * 60 * 60;

struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    fn insert_pending(&self) -> Uuid {
        let id = Uuid::new_v4();
        let user = User {
            id,
            email: format!("{id}@example.com"),
            first_name: "Pending".to_string(),
            last_name: "User".to_string(),
            password_hash: String::new(),
            is_staff: false,
            is_superuser: false,
            is_active: false,
            date_joined: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.lock().unwrap().insert(id, user);
        id
    }

    fn is_active(&self, id: Uuid) -> bool {
        self.users.lock().unwrap().get(&id).map(|u| u.is_active) == Some(true)
    }
}

#[async_trait]
impl ActivationStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn activate_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&id) {
            Some(user) if !user.is_active => {
                user.is_active = true;
                user.updated_at = Utc::now();
                Ok(Some(user.clone()))
            }
            _ => Ok(None),
        }
    }
}

fn service(store: MemoryStore) -> ActivationService<MemoryStore> {
    ActivationService::new(TimestampSigner::new(SECRET), DAY_SECS, store)
}

#[tokio::test]
async fn fresh_token_activates_user() {
    let store = MemoryStore::new();
    let user_id = store.insert_pending();
    let service = service(store);

    let token = service.mint(user_id);
    let user = service.verify_and_activate(&token).await.unwrap();

    assert_eq!(user.id, user_id);
    assert!(user.is_active);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let store = MemoryStore::new();
    let user_id = store.insert_pending();
    let service = service(store);

    // Forge a token issued just past the acceptance window
    let aged = TimestampSigner::new(SECRET).sign_at(
        &user_id.to_string(),
        Utc::now() - Duration::seconds(DAY_SECS + 1),
    );

    match service.verify_and_activate(&aged).await {
        Err(ActivationError::ExpiredToken) => {}
        other => panic!("expected ExpiredToken, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn token_just_inside_window_is_accepted() {
    let store = MemoryStore::new();
    let user_id = store.insert_pending();
    let service = service(store);

    let token = TimestampSigner::new(SECRET).sign_at(
        &user_id.to_string(),
        Utc::now() - Duration::seconds(DAY_SECS - 2),
    );

    let user = service.verify_and_activate(&token).await.unwrap();
    assert!(user.is_active);
}

#[tokio::test]
async fn corrupted_signature_is_rejected() {
    let store = MemoryStore::new();
    let user_id = store.insert_pending();
    let service = service(store);

    let token = service.mint(user_id);
    let mut chars: Vec<char> = token.chars().collect();
    let last = *chars.last().unwrap();
    *chars.last_mut().unwrap() = if last == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    match service.verify_and_activate(&tampered).await {
        Err(ActivationError::InvalidToken) => {}
        other => panic!("expected InvalidToken, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let store = MemoryStore::new();
    store.insert_pending();
    let service = service(store);

    for garbage in ["", "abc", "a.b.c", "not-even-close"] {
        match service.verify_and_activate(garbage).await {
            Err(ActivationError::InvalidToken) => {}
            other => panic!(
                "expected InvalidToken for {garbage:?}, got {:?}",
                other.map(|u| u.id)
            ),
        }
    }
}

#[tokio::test]
async fn valid_token_for_unknown_user_is_rejected() {
    let service = service(MemoryStore::new());

    let token = service.mint(Uuid::new_v4());
    match service.verify_and_activate(&token).await {
        Err(ActivationError::UnknownUser) => {}
        other => panic!("expected UnknownUser, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn token_signing_a_non_uuid_payload_is_invalid() {
    let service = service(MemoryStore::new());

    let token = TimestampSigner::new(SECRET).sign("12345");
    match service.verify_and_activate(&token).await {
        Err(ActivationError::InvalidToken) => {}
        other => panic!("expected InvalidToken, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn second_verification_reports_already_active_and_keeps_flag() {
    let store = MemoryStore::new();
    let user_id = store.insert_pending();
    let service = service(store);

    let token = service.mint(user_id);
    assert!(service.verify_and_activate(&token).await.is_ok());

    // Same still-valid token again: no reactivation, no flag churn
    match service.verify_and_activate(&token).await {
        Err(ActivationError::AlreadyActive) => {}
        other => panic!("expected AlreadyActive, got {:?}", other.map(|u| u.id)),
    }
    assert!(service.store().is_active(user_id));
}

#[tokio::test]
async fn activation_is_monotonic_under_racing_tokens() {
    let store = MemoryStore::new();
    let user_id = store.insert_pending();
    let service = service(store);

    // Two independently minted tokens for the same user; only the first
    // redemption flips the flag, the second converges on AlreadyActive.
    let first = service.mint(user_id);
    let second = service.mint(user_id);

    assert!(service.verify_and_activate(&first).await.is_ok());
    match service.verify_and_activate(&second).await {
        Err(ActivationError::AlreadyActive) => {}
        other => panic!("expected AlreadyActive, got {:?}", other.map(|u| u.id)),
    }
    assert!(service.store().is_active(user_id));
}
