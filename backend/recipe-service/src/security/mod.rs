pub mod jwt;
/// Security utilities: password hashing, session tokens, reset tokens and
/// the ownership guard
pub mod ownership;
pub mod password;

pub use ownership::{authorize, require_owner, Principal};
pub use password::{hash_password, verify_password};

use rand::RngCore;
use sha2::{Digest, Sha256};

const TOKEN_LENGTH: usize = 32;

/// Generate a random token for password reset links (64 hex chars).
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a token for storage; the plaintext never touches the database.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_creates_valid_length() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH * 2); // Each byte = 2 hex chars
    }

    #[test]
    fn test_generate_token_uniqueness() {
        let tokens: Vec<String> = (0..10).map(|_| generate_token()).collect();
        let unique: std::collections::HashSet<_> = tokens.iter().collect();
        assert_eq!(unique.len(), tokens.len());
    }

    #[test]
    fn test_token_format_is_hex() {
        let token = generate_token();
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_token_is_deterministic() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
    }
}
