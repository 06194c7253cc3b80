use anyhow::{anyhow, Result};
/// Session token generation and validation using HS256
/// Access tokens: 1-hour expiry
/// Refresh tokens: 30-day expiry
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 1;
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

pub const REFRESH_TOKEN_EXPIRY_SECS: i64 = REFRESH_TOKEN_EXPIRY_DAYS * 24 * 3600;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type: "access" or "refresh"
    pub token_type: String,
    /// Email address
    pub email: String,
}

/// Access token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

// Thread-safe storage for JWT keys installed from configuration at startup
lazy_static! {
    static ref JWT_KEYS: RwLock<Option<(EncodingKey, DecodingKey)>> = RwLock::new(None);
}

/// Install the symmetric signing secret.
/// Must be called during application startup before any JWT operations.
pub fn initialize_keys(secret: &str) -> Result<()> {
    if secret.is_empty() {
        return Err(anyhow!("JWT secret must not be empty"));
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut keys = JWT_KEYS
        .write()
        .map_err(|e| anyhow!("Failed to acquire write lock on JWT keys: {}", e))?;
    *keys = Some((encoding_key, decoding_key));

    Ok(())
}

fn get_encoding_key() -> Result<EncodingKey> {
    let keys = JWT_KEYS
        .read()
        .map_err(|e| anyhow!("Failed to acquire read lock on JWT keys: {}", e))?;

    keys.as_ref()
        .map(|(enc, _)| enc.clone())
        .ok_or_else(|| anyhow!("JWT keys not initialized. Call initialize_keys() during startup"))
}

fn get_decoding_key() -> Result<DecodingKey> {
    let keys = JWT_KEYS
        .read()
        .map_err(|e| anyhow!("Failed to acquire read lock on JWT keys: {}", e))?;

    keys.as_ref()
        .map(|(_, dec)| dec.clone())
        .ok_or_else(|| anyhow!("JWT keys not initialized. Call initialize_keys() during startup"))
}

/// Generate a new access token
pub fn generate_access_token(user_id: Uuid, email: &str) -> Result<String> {
    let now = Utc::now();
    let expiry = now + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS);

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        token_type: "access".to_string(),
        email: email.to_string(),
    };

    let encoding_key = get_encoding_key()?;
    encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)
        .map_err(|e| anyhow!("Failed to generate access token: {}", e))
}

/// Generate a new refresh token
pub fn generate_refresh_token(user_id: Uuid, email: &str) -> Result<String> {
    let now = Utc::now();
    let expiry = now + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS);

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        token_type: "refresh".to_string(),
        email: email.to_string(),
    };

    let encoding_key = get_encoding_key()?;
    encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)
        .map_err(|e| anyhow!("Failed to generate refresh token: {}", e))
}

/// Generate both access and refresh tokens
pub fn generate_token_pair(user_id: Uuid, email: &str) -> Result<TokenResponse> {
    let access_token = generate_access_token(user_id, email)?;
    let refresh_token = generate_refresh_token(user_id, email)?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_EXPIRY_HOURS * 3600, // Convert to seconds
    })
}

/// Validate and decode a token
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let decoding_key = get_decoding_key()?;
    decode::<Claims>(token, &decoding_key, &Validation::new(Algorithm::HS256))
        .map_err(|e| anyhow!("Token validation failed: {}", e))
}

/// Extract user ID from token
pub fn get_user_id_from_token(token: &str) -> Result<Uuid> {
    let token_data = validate_token(token)?;
    Uuid::parse_str(&token_data.claims.sub).map_err(|e| anyhow!("Invalid user ID in token: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        initialize_keys("unit-test-jwt-secret").unwrap();
    }

    #[test]
    fn test_generate_access_token() {
        init();
        let token = generate_access_token(Uuid::new_v4(), "test@example.com").unwrap();
        assert!(!token.is_empty());
        // JWT tokens have 3 parts separated by dots
        assert_eq!(token.matches('.').count(), 2);
    }

    #[test]
    fn test_generate_token_pair() {
        init();
        let tokens = generate_token_pair(Uuid::new_v4(), "test@example.com").unwrap();
        assert!(!tokens.access_token.is_empty());
        assert!(!tokens.refresh_token.is_empty());
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 3600); // 1 hour in seconds
    }

    #[test]
    fn test_validate_valid_token() {
        init();
        let user_id = Uuid::new_v4();
        let token = generate_access_token(user_id, "test@example.com").unwrap();

        let token_data = validate_token(&token).unwrap();
        assert_eq!(token_data.claims.sub, user_id.to_string());
        assert_eq!(token_data.claims.email, "test@example.com");
        assert_eq!(token_data.claims.token_type, "access");
    }

    #[test]
    fn test_validate_invalid_token() {
        init();
        assert!(validate_token("not.a.valid.token").is_err());
    }

    #[test]
    fn test_validate_corrupted_token() {
        init();
        let token = generate_access_token(Uuid::new_v4(), "test@example.com").unwrap();
        let corrupted = format!("{}x", &token[..token.len() - 1]);
        assert!(validate_token(&corrupted).is_err());
    }

    #[test]
    fn test_refresh_token_has_longer_expiry() {
        init();
        let user_id = Uuid::new_v4();
        let access = generate_access_token(user_id, "test@example.com").unwrap();
        let refresh = generate_refresh_token(user_id, "test@example.com").unwrap();

        let access_claims = validate_token(&access).unwrap().claims;
        let refresh_claims = validate_token(&refresh).unwrap().claims;

        assert!(refresh_claims.exp > access_claims.exp);
        assert_eq!(refresh_claims.token_type, "refresh");
    }

    #[test]
    fn test_get_user_id_from_token() {
        init();
        let user_id = Uuid::new_v4();
        let token = generate_access_token(user_id, "test@example.com").unwrap();
        assert_eq!(get_user_id_from_token(&token).unwrap(), user_id);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(initialize_keys("").is_err());
    }
}
