use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// How long an issued token stays valid.
pub const TOKEN_LIFETIME_SECS: i64 = 5 * 60;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Payload signed into every token. Field names on the wire are
/// `username` and `exp` (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "username")]
    pub subject: String,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl Claims {
    /// `None` when `exp` is outside the representable timestamp range.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}

/// Source of "now" for issuance and expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Process-wide HMAC secret shared by issuance and verification.
#[derive(Clone)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(secret.as_ref()))
    }

    /// An empty secret still signs and verifies deterministically, but anyone
    /// can mint tokens for it.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret(<redacted {} bytes>)", self.0.len())
    }
}

pub struct TokenIssuer {
    key: EncodingKey,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(secret: &SigningSecret, clock: Arc<dyn Clock>) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::seconds(TOKEN_LIFETIME_SECS),
            clock,
        }
    }

    #[cfg(test)]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Mints a token for `subject` expiring one lifetime from now.
    ///
    /// The subject is not validated; callers are expected to have
    /// authenticated it already.
    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        // exp has whole-second resolution, so the issuance instant is truncated too
        let issued_at = self.clock.now().timestamp();
        let claims = Claims {
            subject: subject.to_string(),
            expires_at: issued_at + self.lifetime.num_seconds(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        debug!(subject = %claims.subject, expires_at = claims.expires_at, "issued token");
        Ok(token)
    }
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(secret: &SigningSecret, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against the injected clock with zero leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        }
    }

    /// Checks the signature, then expiry, and returns the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)?.claims;

        if claims.expires_at_utc().is_none() {
            return Err(AuthError::MalformedToken(format!(
                "exp {} is not a valid timestamp",
                claims.expires_at
            )));
        }

        if self.clock.now().timestamp() >= claims.expires_at {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}
