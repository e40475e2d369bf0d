//! Stateless token codec: dual-secret JWT issue and verify.

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::principal::Role;

/// Codec failures. `Encoding` should never occur on well-formed input and
/// indicates a programming error rather than a user-facing condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("malformed token")]
    Malformed,
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Which secret and lifetime a token is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed claim set. Created per issuance, never mutated; only `jti` is
/// tracked server-side, as part of the refresh record key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

struct KeySet {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl KeySet {
    fn from_secret(secret: &[u8], ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_seconds,
        }
    }
}

/// Signs and verifies compact claim sets with independent access and refresh
/// secrets. Verification has no side effects.
pub struct TokenCodec {
    access: KeySet,
    refresh: KeySet,
}

impl TokenCodec {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access: KeySet::from_secret(
                config.access_secret().expose_secret().as_bytes(),
                config.access_ttl_seconds(),
            ),
            refresh: KeySet::from_secret(
                config.refresh_secret().expose_secret().as_bytes(),
                config.refresh_ttl_seconds(),
            ),
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeySet {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Sign a claim set for `subject` under the given `jti`.
    ///
    /// # Errors
    /// Returns [`TokenError::Encoding`] if serialization or signing fails.
    pub fn issue(
        &self,
        kind: TokenKind,
        subject: Uuid,
        role: Role,
        jti: Uuid,
    ) -> Result<String, TokenError> {
        let keys = self.keys(kind);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject,
            jti,
            role,
            iat: now,
            exp: now + keys.ttl_seconds,
        };
        encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|err| TokenError::Encoding(err.to_string()))
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// # Errors
    /// [`TokenError::Expired`] past expiry, [`TokenError::InvalidSignature`]
    /// when tampered or signed with the wrong secret, [`TokenError::Malformed`]
    /// otherwise.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        // No leeway: an expired token is expired, full stop.
        validation.leeway = 0;
        decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }
}
