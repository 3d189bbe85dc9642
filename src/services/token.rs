//! Bearer token codec
//!
//! Issues and verifies signed, time-limited bearer tokens (JWT, HS256)
//! binding a subject identity. The symmetric signing key is injected at
//! construction and constant for the process lifetime.
//!
//! Verification takes the current time as a parameter so expiry can be
//! simulated deterministically in tests. The validity window is exclusive:
//! a token is valid iff `now < exp`, with zero leeway.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Token validity window in minutes, fixed at issuance.
pub const TOKEN_TTL_MINUTES: i64 = 30;

/// Claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// Subject: the authenticated user's email
    sub: String,
    /// Issued-at (unix seconds)
    iat: i64,
    /// Expiry (unix seconds)
    exp: i64,
}

/// Verification failure.
///
/// Both variants are policy results, not faults; malformed input never
/// propagates a foreign error past this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, malformed payload, or unrecognized algorithm
    #[error("invalid token")]
    Invalid,
    /// Structurally valid token whose validity window has elapsed
    #[error("token expired")]
    Expired,
}

/// Token codec holding the process-wide signing key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    /// Create a codec from the symmetric signing secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for the given subject, valid for 30 minutes from `now`.
    pub fn issue(&self, subject: &str, now: DateTime<Utc>) -> anyhow::Result<String> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(TOKEN_TTL_MINUTES)).timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))?;

        Ok(token)
    }

    /// Verify a token against the signing key and the supplied clock,
    /// returning the subject on success.
    ///
    /// The `alg` header is self-describing but only HS256 is accepted; any
    /// other algorithm is invalid. Expiry is exact: `now >= exp` is expired.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the supplied clock, not the wall
        // clock inside the library, and with zero leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Invalid)?;

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims.sub)
    }
}
