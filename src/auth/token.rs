use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::Role,
    error::{AppError, Result},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<String> {
        self.issue_at(user_id, role, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, role: Role, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: user_id,
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Any signature, expiry or format problem is reported as `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected bearer token: {}", e);
                AppError::Unauthorized
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_verifies() {
        let signer = TokenSigner::new("test-secret", 30);
        let user_id = Uuid::new_v4();

        let token = signer.issue(user_id, Role::Institute).unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Institute);
    }

    #[test]
    fn test_rejects_foreign_and_expired_tokens() {
        let signer = TokenSigner::new("test-secret", 30);
        let other = TokenSigner::new("other-secret", 30);
        let user_id = Uuid::new_v4();

        let foreign = other.issue(user_id, Role::Admin).unwrap();
        assert!(matches!(signer.verify(&foreign), Err(AppError::Unauthorized)));

        let stale = signer
            .issue_at(user_id, Role::Student, Utc::now() - Duration::days(31))
            .unwrap();
        assert!(matches!(signer.verify(&stale), Err(AppError::Unauthorized)));

        assert!(matches!(signer.verify("not-a-token"), Err(AppError::Unauthorized)));
    }
}
