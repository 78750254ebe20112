//! Access token signing and validation
//!
//! Access tokens are HS256 JWTs carrying `{iss, sub, iat, exp}`. They are
//! self-contained: nothing is persisted and they cannot be revoked, only left
//! to expire.

use crate::{config::AppConfig, error::AuthError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value of the `iss` claim on every access token
pub const ISSUER: &str = "chirpy";

/// Claims of a signed access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer; absent decodes as empty and fails the issuer check
    #[serde(default)]
    pub iss: String,

    /// Subject (user ID)
    pub sub: String,

    /// Issued at, unix seconds
    pub iat: i64,

    /// Expiration, unix seconds
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(subject: &Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            iss: ISSUER.to_string(),
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    /// Sign the claims into a compact JWT
    pub fn sign(&self, key: &EncodingKey) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), self, key).map_err(|e| {
            tracing::error!(error = %e, "Failed to encode access token");
            AuthError::Internal(format!("Failed to encode access token: {}", e))
        })
    }

    /// Decode `token`, check its signature, then check expiry against `now`
    /// and the issuer.
    pub fn verify(token: &str, key: &DecodingKey, now: DateTime<Utc>) -> Result<Self, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is compared below so that `now == exp` counts as expired
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<AccessClaims>(token, key, &validation)
            .map_err(|e| {
                let err = match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        AuthError::InvalidSignature
                    }
                    ErrorKind::ExpiredSignature => AuthError::Expired,
                    ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
                    _ => AuthError::MalformedToken,
                };
                tracing::debug!(kind = err.kind(), "Access token rejected");
                err
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            tracing::debug!(kind = "expired", "Access token rejected");
            return Err(AuthError::Expired);
        }

        if claims.iss != ISSUER {
            tracing::debug!(kind = "issuer_mismatch", "Access token rejected");
            return Err(AuthError::IssuerMismatch);
        }

        Ok(claims)
    }

    /// Subject as a user id
    pub fn subject(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::MalformedToken)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Signs and verifies access tokens with one symmetric secret
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AccessTokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Create codec from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AuthError> {
        let secret = config.security.jwt_secret.expose_secret();

        if secret.len() < 32 {
            return Err(AuthError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self::new(secret.as_bytes()))
    }

    /// Issue a token for `subject` valid for `ttl` from now
    pub fn issue(&self, subject: &Uuid, ttl: Duration) -> Result<String, AuthError> {
        self.issue_at(subject, Utc::now(), ttl)
    }

    pub fn issue_at(
        &self,
        subject: &Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        AccessClaims::new(subject, now, ttl).sign(&self.encoding_key)
    }

    /// Validate a token and return its subject
    pub fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AuthError> {
        AccessClaims::verify(token, &self.decoding_key, now)?.subject()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_32_characters_long!";

    #[test]
    fn test_issue_and_validate() {
        let codec = AccessTokenCodec::new(SECRET);
        let user_id = Uuid::new_v4();

        let token = codec.issue(&user_id, Duration::hours(1)).unwrap();
        assert_eq!(codec.validate(&token).unwrap(), user_id);
    }

    #[test]
    fn test_claims_carry_issuer_and_window() {
        let now = Utc::now();
        let claims = AccessClaims::new(&Uuid::nil(), now, Duration::seconds(90));

        assert_eq!(claims.iss, "chirpy");
        assert_eq!(claims.exp - claims.iat, 90);
        assert_eq!(claims.subject().unwrap(), Uuid::nil());
        assert_eq!(claims.expires_at().unwrap().timestamp(), claims.exp);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = AccessTokenCodec::new(SECRET);
        let user_id = Uuid::new_v4();
        let issued = Utc::now();
        let token = codec.issue_at(&user_id, issued, Duration::hours(1)).unwrap();

        let almost = issued + Duration::hours(1) - Duration::seconds(1);
        assert_eq!(codec.validate_at(&token, almost).unwrap(), user_id);

        let at_expiry = issued + Duration::hours(1);
        assert!(matches!(codec.validate_at(&token, at_expiry), Err(AuthError::Expired)));
    }

    #[test]
    fn test_missing_issuer_is_mismatch() {
        #[derive(Serialize)]
        struct NoIssuer {
            sub: String,
            iat: i64,
            exp: i64,
        }

        let now = Utc::now();
        let claims = NoIssuer {
            sub: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let codec = AccessTokenCodec::new(SECRET);
        assert!(matches!(codec.validate(&token), Err(AuthError::IssuerMismatch)));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let codec = AccessTokenCodec::new(SECRET);
        assert!(matches!(codec.validate("invalid_token"), Err(AuthError::MalformedToken)));
        assert!(matches!(codec.validate(""), Err(AuthError::MalformedToken)));
    }
}
