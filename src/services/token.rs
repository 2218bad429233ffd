//! Stateless session tokens: HS256 JWTs signed with a process-wide secret.
//!
//! There is no revocation list. A token stays valid until `exp`; the guard
//! re-reads the account on every request so bans and role changes apply
//! immediately anyway.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::domain::Role;
use crate::services::AuthError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// An empty `jwt_secret` gets a random secret that dies with the process.
    #[must_use]
    pub fn from_config(config: &SecurityConfig) -> Self {
        let ttl = Duration::hours(i64::try_from(config.token_ttl_hours).unwrap_or(24));

        if config.jwt_secret.is_empty() {
            warn!("No JWT secret configured; generated a per-process secret, tokens will not survive a restart");
            Self::new(generate_secret().as_bytes(), ttl)
        } else {
            Self::new(config.jwt_secret.as_bytes(), ttl)
        }
    }

    pub fn issue(&self, user_id: Uuid, username: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        self.sign(&Claims {
            sub: user_id,
            username: username.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Signature and expiry only. Any failure is [`AuthError::InvalidToken`].
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

fn generate_secret() -> String {
    use rand::Rng;

    let bytes: [u8; 32] = rand::rng().random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret-long-enough", Duration::hours(24))
    }

    #[test]
    fn issued_token_verifies() {
        let tokens = service();
        let id = Uuid::new_v4();

        let token = tokens.issue(id, "alice", Role::Author).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Author);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let past = Utc::now() - Duration::hours(2);

        let token = tokens
            .sign(&Claims {
                sub: Uuid::new_v4(),
                username: "alice".to_string(),
                role: Role::User,
                iat: past.timestamp(),
                exp: (past + Duration::hours(1)).timestamp(),
            })
            .unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = TokenService::new(b"some-other-secret-value", Duration::hours(1));
        let token = other.issue(Uuid::new_v4(), "mallory", Role::Admin).unwrap();

        assert!(matches!(service().verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(service().verify("not.a.jwt"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn empty_secret_generates_one() {
        let config = SecurityConfig::default();
        let tokens = TokenService::from_config(&config);
        let token = tokens.issue(Uuid::new_v4(), "bob", Role::User).unwrap();
        assert!(tokens.verify(&token).is_ok());

        // A second generated secret does not accept the first one's tokens.
        let other = TokenService::from_config(&config);
        assert!(other.verify(&token).is_err());
    }
}
