//! Bearer credential validation for the privileged cancel action.
//!
//! Credentials are HS256-signed JWTs verified against a single shared
//! secret configured at deploy time. The guard validates structure,
//! signature, and the required expiry claim before the cancel mutation
//! is allowed anywhere near the state engine. No other action is
//! gated.
//!
//! Token issuance is out-of-band: [`mint_token`] exists for operational
//! tooling and tests, not as an HTTP endpoint.

use std::time::Duration;

use axum::http::{header, HeaderMap};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Ways a bearer credential can fail validation.
///
/// All variants map to the same `Unauthorized` outcome at the HTTP
/// layer; the distinction exists for logs and tests.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header was presented.
    #[error("missing bearer credential")]
    MissingCredential,

    /// The credential is not a structurally valid signed token.
    #[error("malformed credential: {0}")]
    Malformed(String),

    /// The signature does not match the configured secret.
    #[error("invalid credential signature")]
    BadSignature,

    /// The credential's expiry claim is in the past.
    #[error("expired credential")]
    Expired,
}

/// Claims carried by a cancel credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Who the token was issued to (informational only).
    pub sub: String,
    /// Issued-at time, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry time, seconds since the Unix epoch. Required; a token
    /// without it is rejected as malformed.
    pub exp: i64,
}

/// Validates bearer credentials against the shared deploy-time secret.
#[derive(Clone)]
pub struct AuthGuard {
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthGuard {
    /// Create a guard for the given shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a bearer credential and return its claims.
    ///
    /// # Errors
    ///
    /// Returns the matching [`AuthError`] variant when the token is
    /// malformed, carries a bad signature, or has expired.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::BadSignature,
                other => AuthError::Malformed(format!("{other:?}")),
            })
    }
}

/// Extract the bearer token from an `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Issue a credential for the given subject, valid for `ttl`.
///
/// This is the out-of-band issuance path (ops tooling, tests); the
/// service itself never mints tokens.
///
/// # Errors
///
/// Returns [`AuthError::Malformed`] if the claims cannot be encoded.
pub fn mint_token(secret: &str, subject: &str, ttl: Duration) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    let claims = Claims {
        sub: subject.to_owned(),
        iat: now,
        exp: now.saturating_add(ttl_secs),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Malformed(format!("{e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn valid_token_verifies() {
        let guard = AuthGuard::new(SECRET);
        let token = mint_token(SECRET, "testuser", Duration::from_secs(60)).unwrap();
        let claims = guard.verify(&token).unwrap();
        assert_eq!(claims.sub, "testuser");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_a_bad_signature() {
        let guard = AuthGuard::new(SECRET);
        let token = mint_token("some-other-secret", "testuser", Duration::from_secs(60)).unwrap();
        assert!(matches!(guard.verify(&token), Err(AuthError::BadSignature)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let guard = AuthGuard::new(SECRET);
        // Mint a token whose expiry is already two minutes in the past,
        // beyond the default validation leeway.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: String::from("testuser"),
            iat: now - 300,
            exp: now - 120,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(guard.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn token_without_expiry_is_malformed() {
        #[derive(Serialize)]
        struct NoExpiry {
            sub: String,
            iat: i64,
        }
        let guard = AuthGuard::new(SECRET);
        let claims = NoExpiry {
            sub: String::from("testuser"),
            iat: Utc::now().timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(guard.verify(&token), Err(AuthError::Malformed(_))));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let guard = AuthGuard::new(SECRET);
        assert!(matches!(
            guard.verify("not-a-jwt"),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn bearer_token_extracts_the_credential() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes_and_absence() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert_eq!(bearer_token(&headers), None);
    }
}
