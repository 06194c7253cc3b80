/// Email service for sending activation and password reset emails
use crate::config::EmailSettings;
use crate::error::{AppError, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

/// Async email transport wrapper (SMTP or no-op)
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
    activation_base_url: Option<String>,
    password_reset_base_url: Option<String>,
}

impl EmailService {
    /// Build email service from configuration
    ///
    /// If SMTP host is empty, operates in no-op mode (logs only).
    /// Useful for development and testing without email infrastructure.
    pub fn new(config: &EmailSettings) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; email service will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| AppError::Internal(format!("Failed to configure SMTP transport: {}", e)))?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            from,
            activation_base_url: config.activation_base_url.clone(),
            password_reset_base_url: config.password_reset_base_url.clone(),
        })
    }

    /// Check if SMTP transport is enabled
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send the account activation email with its confirmation link.
    pub async fn send_activation_email(&self, recipient: &str, token: &str) -> Result<()> {
        let link = self.build_activation_link(token);
        let subject = "Activate your Savora account";
        let body = format!(
            "Welcome to Savora!\n\nPlease follow the link below to activate your account:\n{}\n\nThe link is valid for 24 hours. If you did not register, please ignore this email.",
            link
        );
        self.send_mail(recipient, subject, &body).await
    }

    /// Send the password reset email with its reset link.
    pub async fn send_password_reset_email(&self, recipient: &str, token: &str) -> Result<()> {
        let link = self.build_password_reset_link(token);
        let subject = "Savora password reset";
        let body = format!(
            "We received a request to reset your password.\n\nPlease follow the link below to choose a new one:\n{}\n\nThe link expires in 1 hour. If you did not request this, please ignore this email.",
            link
        );
        self.send_mail(recipient, subject, &body).await
    }

    fn build_activation_link(&self, token: &str) -> String {
        match &self.activation_base_url {
            Some(base) if !base.is_empty() => format!("{base}?token={token}"),
            _ => format!("https://app.savora.dev/activate?token={token}"),
        }
    }

    fn build_password_reset_link(&self, token: &str) -> String {
        match &self.password_reset_base_url {
            Some(base) if !base.is_empty() => format!("{base}?token={token}"),
            _ => format!("https://app.savora.dev/reset-password?token={token}"),
        }
    }

    async fn send_mail(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        if let Some(transport) = &self.transport {
            let to = recipient
                .parse::<Mailbox>()
                .map_err(|e| AppError::Internal(format!("Invalid recipient email address: {}", e)))?;

            let email = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(subject)
                .header(header::ContentType::TEXT_PLAIN)
                .body(body.to_string())
                .map_err(|e| AppError::Internal(format!("Failed to build email message: {}", e)))?;

            transport.send(email).await?;
            info!(subject, "email sent successfully");
        } else {
            info!(
                subject,
                recipient, "Email service running in no-op mode; skipping actual send"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailSettings;

    fn noop_settings() -> EmailSettings {
        EmailSettings {
            smtp_host: String::new(),
            smtp_port: 1025,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "noreply@savora.dev".to_string(),
            use_starttls: false,
            activation_base_url: Some("https://example.com/activate".to_string()),
            password_reset_base_url: None,
        }
    }

    #[test]
    fn test_noop_mode_when_host_missing() {
        let service = EmailService::new(&noop_settings()).unwrap();
        assert!(!service.is_enabled());
    }

    #[test]
    fn test_activation_link_uses_configured_base() {
        let service = EmailService::new(&noop_settings()).unwrap();
        assert_eq!(
            service.build_activation_link("abc"),
            "https://example.com/activate?token=abc"
        );
        // Reset base is unset, so the default hostname applies
        assert_eq!(
            service.build_password_reset_link("abc"),
            "https://app.savora.dev/reset-password?token=abc"
        );
    }

    #[tokio::test]
    async fn test_noop_send_succeeds() {
        let service = EmailService::new(&noop_settings()).unwrap();
        service
            .send_activation_email("cook@example.com", "token")
            .await
            .unwrap();
    }

    #[test]
    fn test_invalid_from_address_rejected() {
        let mut settings = noop_settings();
        settings.smtp_from = "not an address".to_string();
        assert!(EmailService::new(&settings).is_err());
    }
}
