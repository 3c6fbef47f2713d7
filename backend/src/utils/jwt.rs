//! JWT token utilities for authentication and authorization.
//!
//! Access and refresh tokens are signed with independent secrets and
//! independent lifetimes; neither verifies under the other's key.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::{ServiceError, ServiceResult};

/// JWT claims carried by both token kinds.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// User email
    pub email: String,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

/// An access/refresh token pair issued in one step.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies the two token kinds.
#[derive(Clone)]
pub struct JwtIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_seconds: u64,
    refresh_ttl_seconds: u64,
}

impl JwtIssuer {
    /// Creates a new JwtIssuer from the configured secrets and lifetimes.
    pub fn new(config: &Config) -> Self {
        Self::from_secrets(
            &config.access_token_secret,
            &config.refresh_token_secret,
            config.access_token_expires_in_seconds,
            config.refresh_token_expires_in_seconds,
        )
    }

    /// Builds an issuer directly from secrets and TTLs.
    pub fn from_secrets(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_seconds: u64,
        refresh_ttl_seconds: u64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    /// Issues an access/refresh pair for a user.
    ///
    /// The two signatures are independent; neither depends on the other.
    pub fn issue_pair(&self, user_id: &str, email: &str) -> ServiceResult<TokenPair> {
        let access_token = self.sign(user_id, email, &self.access_encoding, self.access_ttl_seconds)?;
        let refresh_token =
            self.sign(user_id, email, &self.refresh_encoding, self.refresh_ttl_seconds)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn sign(
        &self,
        user_id: &str,
        email: &str,
        key: &EncodingKey,
        ttl_seconds: u64,
    ) -> ServiceResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(ttl_seconds as i64);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, key).map_err(|e| {
            tracing::error!(error = %e, "jwt signing failed");
            ServiceError::internal_error("token generation failed")
        })
    }

    /// Validates an access token and returns its claims.
    pub fn verify_access(&self, token: &str) -> ServiceResult<Claims> {
        Self::verify(token, &self.access_decoding, "access token")
    }

    /// Validates a refresh token and returns its claims.
    pub fn verify_refresh(&self, token: &str) -> ServiceResult<Claims> {
        Self::verify(token, &self.refresh_decoding, "refresh token")
    }

    fn verify(token: &str, key: &DecodingKey, what: &str) -> ServiceResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ServiceError::unauthorized(format!("{what} is expired"))
                }
                _ => ServiceError::unauthorized(format!("{what} is not valid")),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_issuer(access_ttl: u64, refresh_ttl: u64) -> JwtIssuer {
        JwtIssuer::from_secrets("access-secret", "refresh-secret", access_ttl, refresh_ttl)
    }

    #[test]
    fn issue_pair_signs_two_distinct_tokens() {
        let issuer = test_issuer(900, 604800);
        let pair = issuer.issue_pair("user-1", "a@test.io").expect("pair");
        assert_ne!(pair.access_token, pair.refresh_token);

        let access = issuer.verify_access(&pair.access_token).expect("access");
        assert_eq!(access.sub, "user-1");
        assert_eq!(access.email, "a@test.io");

        let refresh = issuer.verify_refresh(&pair.refresh_token).expect("refresh");
        assert_eq!(refresh.sub, "user-1");
    }

    #[test]
    fn tokens_do_not_verify_under_the_other_secret() {
        let issuer = test_issuer(900, 604800);
        let pair = issuer.issue_pair("user-1", "a@test.io").expect("pair");

        let err = issuer.verify_refresh(&pair.access_token).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized { .. }));

        let err = issuer.verify_access(&pair.refresh_token).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized { .. }));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let issuer = test_issuer(900, 604800);
        let now = Utc::now();
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "a@test.io".to_string(),
            exp: (now - Duration::hours(2)).timestamp() as usize,
            iat: (now - Duration::hours(3)).timestamp() as usize,
        };
        let stale = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"refresh-secret"),
        )
        .unwrap();

        let err = issuer.verify_refresh(&stale).unwrap_err();
        match err {
            ServiceError::Unauthorized { message } => {
                assert!(message.contains("expired"), "unexpected message: {message}")
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn garbage_is_not_valid() {
        let issuer = test_issuer(900, 604800);
        let err = issuer.verify_access("not-a-jwt").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized { .. }));
    }
}
