use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    domain::Role,
    error::{AppError, Result},
};

pub mod token;

pub use token::{Claims, TokenSigner};

pub struct AuthService {
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Self {
        if config.jwt_secret == "change-me-in-production" {
            tracing::warn!("Using the default JWT secret; set EVENTHUB__AUTH__JWT_SECRET");
        }

        Self {
            signer: TokenSigner::new(&config.jwt_secret, config.token_ttl_days),
        }
    }

    pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        let argon2 = Argon2::default();

        Ok(argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    pub async fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    pub fn issue_token(&self, user_id: Uuid, role: Role) -> Result<String> {
        self.signer.issue(user_id, role)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        self.signer.verify(token)
    }
}
