//! Authentication
//!
//! HS256 bearer tokens and argon2 password hashes. Every token carries a
//! `type` claim so an activation link cannot be replayed as a login token.

mod extractor;

pub use extractor::{CurrentShop, CurrentUser};

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::AppError;

const ACTIVATION_TTL_MINUTES: i64 = 5;
const NEWSLETTER_TTL_HOURS: i64 = 12;
const PASSWORD_RESET_TTL_HOURS: i64 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    AccessToken,
    Activation,
    Newsletter,
    PasswordReset,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Email for newsletter tokens, user id for every other kind.
    pub sub: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, access_ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::minutes(access_ttl_minutes),
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::AccessToken => self.access_ttl,
            TokenKind::Activation => Duration::minutes(ACTIVATION_TTL_MINUTES),
            TokenKind::Newsletter => Duration::hours(NEWSLETTER_TTL_HOURS),
            TokenKind::PasswordReset => Duration::hours(PASSWORD_RESET_TTL_HOURS),
        }
    }

    pub fn issue(&self, kind: TokenKind, sub: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            kind,
            exp: (now + self.ttl(kind)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token encoding failed: {e}")))
    }

    /// Decodes `token` and checks it is of the expected kind. Returns the subject.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<String, AppError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("Token has expired.".into()),
                _ => {
                    tracing::debug!("JWT validation failed: {e}");
                    AppError::Unauthorized("Invalid token.".into())
                }
            })?;
        if data.claims.kind != kind {
            return Err(AppError::Unauthorized("Invalid token.".into()));
        }
        Ok(data.claims.sub)
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let keys = JwtKeys::new("secret", 60);
        let token = keys.issue(TokenKind::AccessToken, "user-1").unwrap();
        assert_eq!(keys.verify(&token, TokenKind::AccessToken).unwrap(), "user-1");
    }

    #[test]
    fn test_token_kind_is_enforced() {
        let keys = JwtKeys::new("secret", 60);
        let token = keys.issue(TokenKind::Activation, "user-1").unwrap();
        assert!(keys.verify(&token, TokenKind::AccessToken).is_err());
        let reset = keys.issue(TokenKind::PasswordReset, "user-1").unwrap();
        assert!(keys.verify(&reset, TokenKind::Activation).is_err());
        assert_eq!(keys.verify(&reset, TokenKind::PasswordReset).unwrap(), "user-1");
    }

    #[test]
    fn test_expired_token() {
        let keys = JwtKeys::new("secret", -10);
        let token = keys.issue(TokenKind::AccessToken, "user-1").unwrap();
        let err = keys.verify(&token, TokenKind::AccessToken).unwrap_err();
        assert_eq!(err.to_string(), "Token has expired.");
    }

    #[test]
    fn test_wrong_secret() {
        let token = JwtKeys::new("a", 60).issue(TokenKind::AccessToken, "u").unwrap();
        assert!(JwtKeys::new("b", 60).verify(&token, TokenKind::AccessToken).is_err());
    }

    #[test]
    fn test_password_hash() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-hash"));
    }
}
