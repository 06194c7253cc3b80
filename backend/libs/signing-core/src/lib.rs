//! Timestamped signing primitive shared by Savora services.
//!
//! A [`TimestampSigner`] produces tamper-evident, time-stamped envelopes
//! over short string payloads using HMAC-SHA256 and a server-held secret.
//! Tokens are self-contained: verification recomputes the MAC and checks
//! the embedded issuance timestamp against a caller-supplied maximum age,
//! so nothing has to be persisted between issue and redemption.
//!
//! Wire format (three URL-safe base64 segments joined with `.`):
//!
//! ```text
//! b64(payload) . b64(unix-timestamp) . b64(hmac-sha256(secret, seg1 "." seg2))
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigningError {
    /// Token is malformed, or its signature does not match the payload.
    #[error("signature mismatch or malformed token")]
    BadSignature,

    /// Signature is valid but older than the allowed maximum age.
    #[error("signature expired: age {age_secs}s exceeds max {max_age_secs}s")]
    Expired { age_secs: i64, max_age_secs: i64 },
}

/// Signs string payloads together with an issuance timestamp.
///
/// The signature check always runs before the age check: a token with a
/// doctored timestamp fails as [`SigningError::BadSignature`], never as
/// [`SigningError::Expired`].
#[derive(Clone)]
pub struct TimestampSigner {
    key: Vec<u8>,
}

impl TimestampSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
        }
    }

    /// Sign `value` with the current time.
    pub fn sign(&self, value: &str) -> String {
        self.sign_at(value, Utc::now())
    }

    /// Sign `value` with an explicit issuance time.
    pub fn sign_at(&self, value: &str, issued_at: DateTime<Utc>) -> String {
        let payload = URL_SAFE_NO_PAD.encode(value.as_bytes());
        let timestamp = URL_SAFE_NO_PAD.encode(issued_at.timestamp().to_string());
        let signature = URL_SAFE_NO_PAD.encode(self.mac_for(&payload, &timestamp));
        format!("{payload}.{timestamp}.{signature}")
    }

    /// Verify `token` against the current time and return the payload.
    pub fn unsign(&self, token: &str, max_age: Duration) -> Result<String, SigningError> {
        self.unsign_at(token, max_age, Utc::now())
    }

    /// Verify `token` as of an explicit instant and return the payload.
    pub fn unsign_at(
        &self,
        token: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, SigningError> {
        let mut segments = token.split('.');
        let (payload, timestamp, signature) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(p), Some(t), Some(s), None) => (p, t, s),
            _ => return Err(SigningError::BadSignature),
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SigningError::BadSignature)?;

        let mut mac = self.keyed_mac();
        mac.update(payload.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SigningError::BadSignature)?;

        let issued_at: i64 = String::from_utf8(
            URL_SAFE_NO_PAD
                .decode(timestamp)
                .map_err(|_| SigningError::BadSignature)?,
        )
        .map_err(|_| SigningError::BadSignature)?
        .parse()
        .map_err(|_| SigningError::BadSignature)?;

        let age_secs = now.timestamp() - issued_at;
        let max_age_secs = max_age.num_seconds();
        if age_secs > max_age_secs {
            return Err(SigningError::Expired {
                age_secs,
                max_age_secs,
            });
        }

        let value = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SigningError::BadSignature)?;
        String::from_utf8(value).map_err(|_| SigningError::BadSignature)
    }

    fn mac_for(&self, payload: &str, timestamp: &str) -> Vec<u8> {
        let mut mac = self.keyed_mac();
        mac.update(payload.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    fn keyed_mac(&self) -> HmacSha256 {
        // HMAC-SHA256 accepts keys of any length
        HmacSha256::new_from_slice(&self.key).expect("hmac key of any length")
    }
}
