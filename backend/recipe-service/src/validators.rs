/// Input validation utilities shared by the auth and post handlers
use validator::ValidateEmail;

/// Longest allowed post title, in characters.
pub const MAX_TITLE_CHARS: usize = 20;

/// Validates email format according to RFC 5322
pub fn validate_email(email: &str) -> bool {
    email.validate_email()
}

/// Validates password strength
/// Requirements:
/// - Minimum 8 characters
/// - At least one uppercase letter
/// - At least one lowercase letter
/// - At least one number
/// - At least one special character
pub fn validate_password(password: &str) -> bool {
    if password.len() < 8 {
        return false;
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_special = password.chars().any(|c| !c.is_alphanumeric());

    has_upper && has_lower && has_digit && has_special
}

/// Validates a post title: non-blank and at most [`MAX_TITLE_CHARS`]
/// characters.
pub fn validate_post_title(title: &str) -> bool {
    let trimmed = title.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_TITLE_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("user+tag@example.co.uk"));
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(!validate_email("invalid-email"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@"));
    }

    #[test]
    fn test_validate_password_valid() {
        assert!(validate_password("SecurePass123!"));
        assert!(validate_password("MyPassword@2024"));
    }

    #[test]
    fn test_validate_password_too_short() {
        assert!(!validate_password("Pass1!"));
    }

    #[test]
    fn test_validate_password_missing_classes() {
        assert!(!validate_password("alllowercase1!"));
        assert!(!validate_password("ALLUPPERCASE1!"));
        assert!(!validate_password("NoDigitsHere!"));
        assert!(!validate_password("NoSpecials123"));
    }

    #[test]
    fn test_validate_post_title() {
        assert!(validate_post_title("Braised pork belly"));
        assert!(validate_post_title("exactly twenty chars"));
        assert!(!validate_post_title(""));
        assert!(!validate_post_title("   "));
        assert!(!validate_post_title("a title that runs well past twenty characters"));
    }

    #[test]
    fn test_validate_post_title_counts_chars_not_bytes() {
        // 20 multibyte characters are within the limit
        assert!(validate_post_title("ぶたにくのしょうがやきていしょく"));
    }
}
