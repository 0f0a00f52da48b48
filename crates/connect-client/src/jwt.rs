//! Short-lived ES256 tokens for the Connect API.
//!
//! The private key is parsed once when the minter is built; every outbound
//! call then mints its own token. Tokens are never cached or persisted.

use crate::error::SigningError;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Audience the Connect API expects in every token.
pub const DEFAULT_AUDIENCE: &str = "appstoreconnect-v1";

/// Longest validity window the remote API accepts.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

const MIN_TOKEN_TTL: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
    aud: &'a str,
}

/// A freshly minted bearer token.
#[derive(Clone)]
pub struct SignedToken {
    token: SecretString,
    pub issuer: String,
    pub audience: String,
    pub key_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SignedToken {
    /// The compact JWS encoding.
    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }

    /// Remaining validity relative to `now`.
    pub fn remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.expires_at - now
    }
}

impl fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedToken")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("key_id", &self.key_id)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Produces signed tokens from a fixed issuer, key id and P-256 key.
#[derive(Clone)]
pub struct TokenMinter {
    issuer_id: String,
    key_id: String,
    audience: String,
    ttl: Duration,
    key: Arc<EncodingKey>,
}

impl TokenMinter {
    /// Build a minter from a PKCS#8 PEM encoded P-256 private key.
    pub fn from_pem(
        issuer_id: impl Into<String>,
        key_id: impl Into<String>,
        pem: &[u8],
    ) -> Result<Self, SigningError> {
        if pem.iter().all(u8::is_ascii_whitespace) {
            return Err(SigningError::InvalidKey("key is empty".into()));
        }

        let key =
            EncodingKey::from_ec_pem(pem).map_err(|e| SigningError::InvalidKey(e.to_string()))?;

        Ok(Self {
            issuer_id: issuer_id.into(),
            key_id: key_id.into(),
            audience: DEFAULT_AUDIENCE.into(),
            ttl: MAX_TOKEN_TTL,
            key: Arc::new(key),
        })
    }

    /// Load the private key from disk and build a minter.
    pub fn from_pem_file(
        issuer_id: impl Into<String>,
        key_id: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, SigningError> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|source| SigningError::KeyUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "Loaded signing key");
        Self::from_pem(issuer_id, key_id, &pem)
    }

    /// Override the token audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Set the token lifetime, clamped to the API's maximum window.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl.clamp(MIN_TOKEN_TTL, MAX_TOKEN_TTL);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Mint a new token valid from now for the configured lifetime.
    pub fn mint(&self) -> Result<SignedToken, SigningError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + chrono::Duration::seconds(self.ttl.as_secs() as i64);

        let claims = Claims {
            iss: &self.issuer_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            aud: &self.audience,
        };

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());

        let token = jsonwebtoken::encode(&header, &claims, &self.key)?;

        Ok(SignedToken {
            token: SecretString::new(token),
            issuer: self.issuer_id.clone(),
            audience: self.audience.clone(),
            key_id: self.key_id.clone(),
            issued_at,
            expires_at,
        })
    }
}

impl fmt::Debug for TokenMinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenMinter")
            .field("issuer_id", &self.issuer_id)
            .field("key_id", &self.key_id)
            .field("audience", &self.audience)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
