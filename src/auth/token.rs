//! Signing and verification of compact, tamper-evident tokens.
//!
//! The codec is stateless: it holds only the keys derived from the symmetric
//! secret handed to it at construction time. Expiry is embedded in the signed
//! claim set, so verification rejects stale tokens even when the signature
//! still checks out.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::auth::models::{Claims, Role};

/// Token signing configuration, built explicitly and injected into the codec.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Symmetric signing secret
    pub secret: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime; must exceed the access token lifetime
    pub refresh_token_ttl: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: "campus-auth-dev-secret-change-in-production".to_string(),
            access_token_ttl: Duration::from_secs(60 * 60), // 1 hour
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
        }
    }
}

/// Verification failures, kept distinct so callers can tell a stale token
/// from a tampered or garbled one.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token signature mismatch")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token creation failed: {0}")]
    Creation(String),
}

/// Codec for the signed claim set carried by access and refresh tokens.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    /// Build a codec from an explicit configuration object.
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Sign a claim set expiring `ttl` from now.
    ///
    /// Returns the token together with its expiry instant so session records
    /// can store exactly what was signed.
    pub fn sign(
        &self,
        sub: &str,
        username: &str,
        role: Role,
        device: Option<&str>,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TokenError::Creation(e.to_string()))?
            .as_secs();
        let exp = now + ttl.as_secs();

        let claims = Claims {
            sub: sub.to_string(),
            username: username.to_string(),
            role,
            device: device.map(|d| d.to_string()),
            iat: now,
            exp,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::Creation(e.to_string()))?;

        let expires_at = Utc
            .timestamp_opt(exp as i64, 0)
            .single()
            .ok_or_else(|| TokenError::Creation("expiry out of range".to_string()))?;

        Ok((token, expires_at))
    }

    /// Verify signature and expiry, returning the embedded claim set.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        Ok(token_data.claims)
    }
}
