//! Session token issuing and verification
//!
//! Signs compact session tokens with HS256. A token carries the subject id,
//! issue time, and expiry; verification is strict (zero leeway) and reports
//! signature, expiry, and claim-shape failures separately so callers can log
//! the reason without leaking it to clients.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Default session token lifetime (1 hour)
const TOKEN_TTL_SECS: i64 = 3600;

/// Token service configuration
#[derive(Clone)]
pub struct TokenConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime in seconds
    pub ttl_secs: i64,
}

impl TokenConfig {
    /// Create a new token configuration with the default lifetime
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs: TOKEN_TTL_SECS,
        }
    }

    /// Set the token lifetime in seconds
    pub fn ttl_secs(mut self, secs: i64) -> Self {
        self.ttl_secs = secs;
        self
    }
}

/// Token verification and signing errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            // Structural garbage and claims that do not decode into the
            // expected shape both count as malformed.
            _ => TokenError::Malformed,
        }
    }
}

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Seconds until this token expires (negative once past expiry)
    pub fn remaining_secs(&self) -> i64 {
        self.exp - Utc::now().timestamp()
    }
}

/// Token service issuing and verifying session tokens
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Create a new token service
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a signed session token for the given subject
    pub fn issue(&self, subject: i64) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.ttl_secs);

        let claims = Claims {
            sub: subject,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and decode its claims
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        // Zero leeway: a token is expired the second its exp passes
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    /// Verify a token and return the subject it was issued for
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        Ok(self.decode(token)?.sub)
    }
}
