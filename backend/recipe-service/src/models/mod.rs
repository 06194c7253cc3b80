use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Doubles as the activation state: false means registered but not
    /// yet confirmed by email.
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Post category, stored as its integer discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum PostCategory {
    Chat = 1,
    Event = 2,
    Notice = 3,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub category: Option<PostCategory>,
    /// Storage key of an uploaded image, if any.
    pub image: Option<String>,
    /// Display date, distinct from the record's creation time.
    pub published_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PasswordReset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_trims_missing_parts() {
        let mut user = User {
            id: Uuid::new_v4(),
            email: "cook@example.com".to_string(),
            first_name: "Mei".to_string(),
            last_name: String::new(),
            password_hash: String::new(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            date_joined: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(user.full_name(), "Mei");

        user.last_name = "Tanaka".to_string();
        assert_eq!(user.full_name(), "Mei Tanaka");
    }

    #[test]
    fn test_post_category_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PostCategory::Notice).unwrap(),
            "\"notice\""
        );
        let parsed: PostCategory = serde_json::from_str("\"event\"").unwrap();
        assert_eq!(parsed, PostCategory::Event);
    }
}
