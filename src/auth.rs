//! Access-token issuing and verification
//!
//! Tokens are JWTs signed with a shared secret (HS512 unless configured
//! otherwise) carrying a numeric `sub` plus `iat`/`nbf`/`exp`.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Not before (unix seconds)
    pub nbf: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Signing configuration shared by the register/login handlers and the
/// auth middleware.
pub struct AuthKeys {
    alg: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl AuthKeys {
    pub fn new(secret: &str, alg: &str, ttl: Duration) -> anyhow::Result<Self> {
        let alg = Algorithm::from_str(alg)
            .ok()
            .context("unknown signing algorithm")?;
        Ok(Self {
            alg,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for the user.
    pub fn issue(&self, user_id: i64) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            iat: now,
            nbf: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        encode(&Header::new(self.alg), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "token signing failed");
            AppError::Internal
        })
    }

    /// Verify a token and return the user id it names.
    pub fn verify(&self, token: &str) -> Result<i64, AppError> {
        let mut validation = Validation::new(self.alg);
        validation.set_required_spec_claims(&["exp", "nbf"]);
        validation.validate_nbf = true;

        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|_| AppError::Unauthorized)?;
        if data.claims.sub <= 0 {
            return Err(AppError::Unauthorized);
        }
        Ok(data.claims.sub)
    }
}

/// The `Authorization` header value, with or without a `Bearer ` prefix.
pub fn extract_bearer(header: &str) -> &str {
    header.strip_prefix("Bearer ").unwrap_or(header).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> AuthKeys {
        AuthKeys::new("test-secret", "HS512", Duration::from_secs(3600)).unwrap()
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let keys = keys();
        let token = keys.issue(42).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), 42);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = keys().issue(42).unwrap();
        let other = AuthKeys::new("other-secret", "HS512", Duration::from_secs(3600)).unwrap();
        assert_eq!(other.verify(&token), Err(AppError::Unauthorized));
    }

    #[test]
    fn test_wrong_algorithm_rejected() {
        let token = keys().issue(42).unwrap();
        let hs256 = AuthKeys::new("test-secret", "HS256", Duration::from_secs(3600)).unwrap();
        assert_eq!(hs256.verify(&token), Err(AppError::Unauthorized));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert_eq!(keys().verify("not-a-token"), Err(AppError::Unauthorized));
    }

    #[test]
    fn test_unknown_algorithm_name() {
        assert!(AuthKeys::new("s", "HS-BOGUS", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(extract_bearer("abc.def.ghi"), "abc.def.ghi");
    }
}
