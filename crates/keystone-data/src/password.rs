//! Argon2 password hashing.

use argon2::Argon2;
use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    rand_core::OsRng,
};

use crate::error::{DataError, Result};

/// Hash `password` into a PHC string with a random salt.
///
/// # Errors
///
/// Returns [`DataError::PasswordHash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|detail| DataError::PasswordHash { detail })?;
    Ok(hash.to_string())
}

/// Check `candidate` against a stored PHC hash.
///
/// # Errors
///
/// Returns [`DataError::PasswordHash`] when the stored hash is malformed or
/// verification fails for a reason other than a mismatch.
pub fn verify_password(stored_hash: &str, candidate: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|detail| DataError::PasswordHash { detail })?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(detail) => Err(DataError::PasswordHash { detail }),
    }
}
