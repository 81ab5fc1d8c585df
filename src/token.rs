//! Session token codec
//!
//! Issues and verifies the signed JWTs that carry the request identity. The
//! signing secret is fetched from the secret backend once at startup; there
//! is no rotation.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::Role;

/// Claims embedded in a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub login: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Codec over a process-wide symmetric signing secret
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Issue a token for the given identity claims with a fresh TTL window.
    pub fn issue(
        &self,
        user_id: &str,
        login: &str,
        email: &str,
        role: Role,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            login: login.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&jsonwebtoken::Header::default(), &claims, &self.encoding)
            .map_err(|_| ApiError::Internal)
    }

    /// Verify a token, distinguishing expiry from every other failure.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; the default 60s leeway would keep dead tokens alive.
        validation.leeway = 0;

        let claims = match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    return Err(ApiError::ExpiredToken);
                }
                _ => return Err(ApiError::InvalidToken),
            },
        };

        // The library accepts a token at exactly exp; the session contract
        // treats the expiry instant itself as dead.
        if Utc::now().timestamp() >= claims.exp {
            return Err(ApiError::ExpiredToken);
        }
        Ok(claims)
    }

    /// Re-issue a still-valid token with the same claims and a new TTL window.
    pub fn refresh(&self, token: &str) -> Result<String, ApiError> {
        let claims = self.verify(token)?;
        self.issue(&claims.sub, &claims.login, &claims.email, claims.role)
    }
}
