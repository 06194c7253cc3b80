//! Configuration for the recipe service.
//!
//! Everything is read from environment variables (with a `.env` file for
//! local development). The signing secret and activation max-age are
//! threaded from here into the activation service explicitly; no component
//! reads ambient process configuration at call time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub security: SecuritySettings,
    pub email: EmailSettings,
    pub media: MediaSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            server: ServerSettings::from_env()?,
            security: SecuritySettings::from_env()?,
            email: EmailSettings::from_env()?,
            media: MediaSettings::from_env(),
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
        })
    }
}

/// Secrets and token lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Server-held secret for the activation token signer.
    pub secret_key: String,
    /// Maximum accepted activation token age in seconds.
    pub activation_max_age_secs: i64,
    /// Symmetric secret for HS256 session tokens.
    pub jwt_secret: String,
}

impl SecuritySettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            secret_key: env::var("SECRET_KEY").context("SECRET_KEY must be set")?,
            activation_max_age_secs: env::var("ACTIVATION_MAX_AGE_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("Invalid ACTIVATION_MAX_AGE_SECS")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
        })
    }
}

/// Email service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
    pub activation_base_url: Option<String>,
    pub password_reset_base_url: Option<String>,
}

impl EmailSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "1025".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@savora.dev".to_string()),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            activation_base_url: env::var("EMAIL_ACTIVATION_BASE_URL").ok(),
            password_reset_base_url: env::var("EMAIL_PASSWORD_RESET_BASE_URL").ok(),
        })
    }
}

/// Uploaded media storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSettings {
    pub root: PathBuf,
}

impl MediaSettings {
    fn from_env() -> Self {
        Self {
            root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./media")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test owns all the env mutation so parallel tests never race on
    // shared variable names.
    #[test]
    fn test_settings_from_env() {
        env::set_var("DATABASE_URL", "postgres://localhost/savora_test");
        env::set_var("DATABASE_MAX_CONNECTIONS", "7");
        env::set_var("SECRET_KEY", "activation-secret");
        env::set_var("JWT_SECRET", "session-secret");
        env::set_var("SERVER_PORT", "9999");

        let settings = Settings::from_env().unwrap();

        assert_eq!(settings.database.url, "postgres://localhost/savora_test");
        assert_eq!(settings.database.max_connections, 7);
        assert_eq!(settings.database.min_connections, 2); // Default
        assert_eq!(settings.server.port, 9999);
        assert_eq!(settings.security.secret_key, "activation-secret");
        assert_eq!(settings.security.activation_max_age_secs, 86400); // Default
        assert_eq!(settings.security.jwt_secret, "session-secret");
        assert_eq!(settings.email.smtp_port, 1025); // Default
        assert!(settings.email.activation_base_url.is_none());
        assert_eq!(settings.media.root, PathBuf::from("./media"));

        env::remove_var("DATABASE_URL");
        env::remove_var("DATABASE_MAX_CONNECTIONS");
        env::remove_var("SECRET_KEY");
        env::remove_var("JWT_SECRET");
        env::remove_var("SERVER_PORT");
    }
}
