//! Argon2id password hashing. Stores PHC strings (`$argon2id$v=19$...`) with a random salt.

use crate::domain::DomainError;
use crate::ports::PasswordPort;
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Argon2id with the crate's default (OWASP recommended) parameters.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordPort for Argon2Hasher {
    fn hash(&self, raw: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DomainError::PasswordHash(e.to_string()))
    }

    fn verify(&self, raw: &str, hash: &str) -> Result<bool, DomainError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| DomainError::PasswordHash(e.to_string()))?;
        match self.argon2.verify_password(raw.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(DomainError::PasswordHash(e.to_string())),
        }
    }
}
