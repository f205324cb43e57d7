use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request("Password too short"));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AppError::internal(format!("Password hashing failed: {err}")))?
        .to_string();
    Ok(hash)
}

/// `Err` means the stored hash itself is unreadable, not that the password was wrong.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn hash_verifies_only_the_hashed_password() {
        let hash = hash_password("correct-horse").expect("hash should succeed");

        assert!(verify_password("correct-horse", &hash).expect("hash should parse"));
        assert!(!verify_password("wrong-horse", &hash).expect("hash should parse"));
    }

    #[test]
    fn rejects_short_password() {
        let err = hash_password("short").expect_err("short password should fail");
        assert_eq!(err.message(), "Password too short");
    }

    #[test]
    fn unreadable_hash_is_an_error() {
        assert!(verify_password("password123", "not-a-valid-hash").is_err());
    }
}
