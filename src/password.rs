use crate::error::BookingError;
use argon2::{
    password_hash::{self, rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::fmt;

/// Argon2id credential in PHC string form. The plaintext is never stored.
#[derive(Clone)]
pub struct PasswordHash {
    phc: String,
}

impl PasswordHash {
    pub fn new(password: &str) -> Result<Self, BookingError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| BookingError::CredentialHashing(err.to_string()))?
            .to_string();
        Ok(Self { phc })
    }

    pub fn verify(&self, password: &str) -> bool {
        password_hash::PasswordHash::new(&self.phc)
            .and_then(|hash| Argon2::default().verify_password(password.as_bytes(), &hash))
            .is_ok()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}
